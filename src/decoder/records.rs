//! Record arrays
//!
//! The payload of `select`, `create`, `update`, `change` and `modify`, and
//! the `result` of each query statement.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DriverError, Result};

/// Separator between table and record id in a thing (`users:42`)
pub const RECORD_SEPARATOR: char = ':';

/// Whether `thing` names one record rather than a whole table
pub fn names_record(thing: &str) -> bool {
    thing.contains(RECORD_SEPARATOR)
}

/// What the request asked for, which decides single-object framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// A specific record: single extraction unwraps the first element
    Record,

    /// A whole table: single extraction needs exactly one element
    Table,

    /// A query statement: single extraction takes the first element
    Statement,
}

/// Zero or more records from one reply
#[derive(Debug, Clone, PartialEq)]
pub struct Records {
    values: Vec<Value>,
    framing: Framing,
}

impl Records {
    /// Classify a command payload for the given thing
    ///
    /// `null` is the no-result outcome (an empty array); any other
    /// non-array payload, a bare object included, is a decode error.
    pub fn from_payload(thing: Option<&str>, payload: Value) -> Result<Self> {
        let framing = match thing {
            Some(thing) if names_record(thing) => Framing::Record,
            _ => Framing::Table,
        };

        let values = match payload {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            other => {
                return Err(DriverError::Decode(format!(
                    "Expected an array of records, got {}",
                    kind_of(&other)
                )))
            }
        };

        Ok(Self { values, framing })
    }

    /// Classify the `result` of one query statement
    pub(crate) fn from_statement(result: Value) -> Self {
        let values = match result {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            scalar => vec![scalar],
        };

        Self {
            values,
            framing: Framing::Statement,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// No rows: the distinguished no-result outcome
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Decode into a single object
    ///
    /// `Ok(None)` when there are no records.
    pub fn one<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let value = match (self.framing, self.values.as_slice()) {
            (_, []) => return Ok(None),
            (Framing::Table, [only]) => only,
            (Framing::Table, values) => {
                return Err(DriverError::Decode(format!(
                    "Expected exactly one record for a single destination, got {}",
                    values.len()
                )))
            }
            (Framing::Record | Framing::Statement, [first, ..]) => first,
        };

        decode_value(value.clone()).map(Some)
    }

    /// Decode into a list, passing the array through unchanged
    ///
    /// `Ok(None)` when there are no records.
    pub fn list<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>> {
        if self.values.is_empty() {
            return Ok(None);
        }
        decode_value(Value::Array(self.values.clone())).map(Some)
    }

    /// The payload in the shape the caller most likely wants
    ///
    /// A record target yields the bare object, anything else the array.
    /// `None` when there are no records.
    pub fn into_value(self) -> Option<Value> {
        if self.values.is_empty() {
            return None;
        }
        match self.framing {
            Framing::Record => self.values.into_iter().next(),
            Framing::Table | Framing::Statement => Some(Value::Array(self.values)),
        }
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| DriverError::Decode(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
