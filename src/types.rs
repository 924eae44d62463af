//! Helper types passed as command parameters

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials for `signin`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }
}

/// One JSON Patch operation for `modify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Patch {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self::new("add", path, value)
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::new("replace", path, value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::new("remove", path, Value::Null)
    }

    fn new(op: &str, path: impl Into<String>, value: Value) -> Self {
        Self {
            op: op.to_string(),
            path: path.into(),
            value,
        }
    }
}
