//! Error types for surrealrpc
//!
//! Provides a unified error type for all driver operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using DriverError
pub type Result<T> = std::result::Result<T, DriverError>;

/// Unified error type for driver operations
#[derive(Debug, Error)]
pub enum DriverError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Remote Command Errors
    // -------------------------------------------------------------------------
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Statement {index} failed with status {status}: {detail}")]
    Statement {
        index: usize,
        status: String,
        detail: String,
    },

    // -------------------------------------------------------------------------
    // Decode Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Too few destinations: {statements} statements, {destinations} destinations")]
    TooFewDestinations {
        statements: usize,
        destinations: usize,
    },

    #[error("Too many destinations: {statements} statements, {destinations} destinations")]
    TooManyDestinations {
        statements: usize,
        destinations: usize,
    },

    #[error("{0}")]
    Statements(StatementErrors),

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------
    #[error("Call cancelled")]
    Cancelled,

    #[error("Call timed out")]
    Timeout,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DriverError {
    /// Connection-level failure; the connection is no longer usable
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DriverError::Io(_) | DriverError::Transport(_) | DriverError::ConnectionClosed
        )
    }

    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            DriverError::Protocol(_) | DriverError::FrameTooLarge { .. }
        )
    }

    /// The remote side answered the call with an error
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DriverError::Remote { .. } | DriverError::Statement { .. }
        )
    }

    /// The reply was well-formed but did not fit the requested destination
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            DriverError::Decode(_)
                | DriverError::Serialization(_)
                | DriverError::TooFewDestinations { .. }
                | DriverError::TooManyDestinations { .. }
                | DriverError::Statements(_)
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, DriverError::Cancelled | DriverError::Timeout)
    }
}

/// A decode failure attributed to one statement of a multi-statement query
#[derive(Debug)]
pub struct StatementError {
    /// Zero-based statement position
    pub index: usize,
    pub error: DriverError,
}

/// Every per-statement failure collected while decoding a query reply
#[derive(Debug, Default)]
pub struct StatementErrors(pub Vec<StatementError>);

impl StatementErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatementError> {
        self.0.iter()
    }

    /// Zero-based positions of the statements that failed
    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().map(|e| e.index).collect()
    }
}

impl fmt::Display for StatementErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} statement(s) failed to decode", self.0.len())?;
        for err in &self.0 {
            write!(f, "; statement {}: {}", err.index, err.error)?;
        }
        Ok(())
    }
}
