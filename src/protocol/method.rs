//! Method definitions
//!
//! The RPC commands understood by the remote side.

use std::fmt;

use serde::{Deserialize, Serialize};

/// RPC method names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Use,
    Info,
    Signup,
    Signin,
    Invalidate,
    Authenticate,
    Live,
    Kill,
    Let,
    Query,
    Select,
    Create,
    Update,
    Change,
    Modify,
    Delete,
}

impl Method {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Use => "use",
            Method::Info => "info",
            Method::Signup => "signup",
            Method::Signin => "signin",
            Method::Invalidate => "invalidate",
            Method::Authenticate => "authenticate",
            Method::Live => "live",
            Method::Kill => "kill",
            Method::Let => "let",
            Method::Query => "query",
            Method::Select => "select",
            Method::Create => "create",
            Method::Update => "update",
            Method::Change => "change",
            Method::Modify => "modify",
            Method::Delete => "delete",
        }
    }

    /// Methods whose payload is an array of records
    pub fn returns_records(&self) -> bool {
        matches!(
            self,
            Method::Select | Method::Create | Method::Update | Method::Change | Method::Modify
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
