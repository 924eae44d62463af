//! Multi-statement query replies

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DriverError, Result, StatementError, StatementErrors};
use super::{Destination, Records};

/// Status of a statement that succeeded
pub const STATUS_OK: &str = "OK";

#[derive(Deserialize)]
struct RawStatement {
    status: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    time: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Outcome of one statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementResult {
    pub status: String,
    pub time: String,
    pub records: Records,
}

/// Per-statement results of a `query` call, in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    statements: Vec<StatementResult>,
}

impl QueryResponse {
    /// Parse a `query` payload
    ///
    /// Rejects the whole reply if any statement did not succeed.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let Value::Array(entries) = payload else {
            return Err(DriverError::Decode(
                "Expected an array of statement results".to_string(),
            ));
        };

        let mut statements = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let raw: RawStatement = serde_json::from_value(entry).map_err(|e| {
                DriverError::Decode(format!("Statement {} is malformed: {}", index, e))
            })?;

            if raw.status != STATUS_OK {
                let detail = raw.detail.unwrap_or_else(|| match raw.result {
                    Value::String(message) => message,
                    other => other.to_string(),
                });
                return Err(DriverError::Statement {
                    index,
                    status: raw.status,
                    detail,
                });
            }

            statements.push(StatementResult {
                status: raw.status,
                time: raw.time,
                records: Records::from_statement(raw.result),
            });
        }

        Ok(Self { statements })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[StatementResult] {
        &self.statements
    }

    pub fn statement(&self, index: usize) -> Option<&StatementResult> {
        self.statements.get(index)
    }

    /// Decode the first statement into a single object
    pub fn one<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.statements.first() {
            Some(first) => first.records.one(),
            None => Ok(None),
        }
    }

    /// Decode the first statement into a list
    pub fn list<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>> {
        match self.statements.first() {
            Some(first) => first.records.list(),
            None => Ok(None),
        }
    }

    /// Decode statements into destinations
    ///
    /// One destination receives only the first statement, whatever the
    /// statement count. Otherwise there must be exactly one destination per
    /// statement; each decodes independently and every failure is
    /// collected into [`DriverError::Statements`].
    pub fn unmarshal(&self, destinations: &mut [&mut dyn Destination]) -> Result<()> {
        let statements = self.statements.len();

        if destinations.len() == 1 {
            return match self.statements.first() {
                Some(first) => destinations[0].fill(&first.records),
                None => Ok(()),
            };
        }

        if destinations.len() < statements {
            return Err(DriverError::TooFewDestinations {
                statements,
                destinations: destinations.len(),
            });
        }
        if destinations.len() > statements {
            return Err(DriverError::TooManyDestinations {
                statements,
                destinations: destinations.len(),
            });
        }

        let mut failures = Vec::new();
        for (index, (statement, destination)) in
            self.statements.iter().zip(destinations.iter_mut()).enumerate()
        {
            if let Err(error) = destination.fill(&statement.records) {
                failures.push(StatementError { index, error });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DriverError::Statements(StatementErrors(failures)))
        }
    }
}
