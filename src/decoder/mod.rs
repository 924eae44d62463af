//! Response Decoder
//!
//! Classifies a reply payload by the command that produced it. Decoding is
//! pure: it never blocks and holds no state between replies.
//!
//! ## Rules by Method
//! - `delete`: nothing is decoded
//! - `select`, `create`, `update`, `change`, `modify`: an array of records;
//!   a thing containing `:` names a single record
//! - `query`: an array of `{ status, result, time }`, one per statement
//! - everything else: the raw payload
//!
//! An empty record array is the no-result outcome, surfaced as `Ok(None)`
//! by every typed extraction.

mod records;
mod query;
mod destination;

pub use records::{names_record, Framing, Records, RECORD_SEPARATOR};
pub use query::{QueryResponse, StatementResult, STATUS_OK};
pub use destination::{Destination, List, Single};

use serde_json::Value;

use crate::error::{DriverError, Result};
use crate::protocol::Method;

/// A classified reply payload
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The call succeeded and carries nothing to decode
    Done,

    /// Records from a record-returning command
    Records(Records),

    /// Per-statement results of a query
    Query(QueryResponse),

    /// Payload of a command without structured decoding
    Raw(Value),
}

/// Classify `payload` for `method`, using `thing` (the first parameter)
/// to decide single-record framing
pub fn decode(method: Method, thing: Option<&str>, payload: Value) -> Result<Decoded> {
    match method {
        Method::Delete => Ok(Decoded::Done),
        Method::Query => QueryResponse::from_payload(payload).map(Decoded::Query),
        m if m.returns_records() => Records::from_payload(thing, payload).map(Decoded::Records),
        _ => Ok(Decoded::Raw(payload)),
    }
}

impl Decoded {
    pub fn into_records(self) -> Result<Records> {
        match self {
            Decoded::Records(records) => Ok(records),
            other => Err(unexpected("records", &other)),
        }
    }

    pub fn into_query(self) -> Result<QueryResponse> {
        match self {
            Decoded::Query(query) => Ok(query),
            other => Err(unexpected("statement results", &other)),
        }
    }

    /// The payload of an undecoded command; `Null` for `Done`
    pub fn into_raw(self) -> Result<Value> {
        match self {
            Decoded::Raw(value) => Ok(value),
            Decoded::Done => Ok(Value::Null),
            other => Err(unexpected("a raw payload", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &Decoded) -> DriverError {
    let got = match got {
        Decoded::Done => "nothing",
        Decoded::Records(_) => "records",
        Decoded::Query(_) => "statement results",
        Decoded::Raw(_) => "a raw payload",
    };
    DriverError::Decode(format!("Expected {}, decoded {}", wanted, got))
}
