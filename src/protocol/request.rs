//! Request definitions
//!
//! Call identifiers and the outbound request envelope.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Method;

/// Opaque token correlating one outstanding request with its reply
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Generates call identifiers that never repeat for the generator's lifetime
///
/// Each identifier is a random per-generator prefix followed by a
/// monotonically increasing counter, e.g. `"3fa85f64c2e1-000000000001"`.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_prefix(format!("{:012x}", rand::random::<u64>() & 0xffff_ffff_ffff))
    }

    /// Generator with a fixed prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Produce the next identifier
    pub fn next_id(&self) -> CallId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        CallId(format!("{}-{:012x}", self.prefix, n))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// An outbound call: `{ id, method, params }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: CallId,
    pub method: Method,
    pub params: Vec<Value>,
}

impl Request {
    pub fn new(id: CallId, method: Method, params: Vec<Value>) -> Self {
        Self { id, method, params }
    }

    /// The first parameter when it is a string (the thing acted on)
    pub fn thing(&self) -> Option<&str> {
        self.params.first().and_then(Value::as_str)
    }
}
