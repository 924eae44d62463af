//! Response definitions
//!
//! Represents replies from the remote side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CallId;

/// Error descriptor returned by the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

/// Body of a reply
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `result` was present
    Result(Value),

    /// `error` was present and well-formed
    Error(RemoteError),

    /// The reply named a call but its body was invalid
    Malformed(String),
}

/// A parsed reply, correlated by `id`
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub id: CallId,
    pub payload: Payload,
}

impl ResponseEnvelope {
    /// Create a successful reply
    pub fn result(id: impl Into<CallId>, value: Value) -> Self {
        Self {
            id: id.into(),
            payload: Payload::Result(value),
        }
    }

    /// Create an error reply
    pub fn error(id: impl Into<CallId>, code: i64, message: &str) -> Self {
        Self {
            id: id.into(),
            payload: Payload::Error(RemoteError {
                code,
                message: message.to_string(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self.payload, Payload::Result(_))
    }
}
