//! Typed destinations for multi-statement decoding

use serde::de::DeserializeOwned;

use crate::error::Result;
use super::Records;

/// Somewhere one statement's records can be decoded into
pub trait Destination {
    /// Decode `records` into this destination
    ///
    /// No records leaves the destination empty and is not an error.
    fn fill(&mut self, records: &Records) -> Result<()>;
}

/// A destination expecting one object
#[derive(Debug, Clone, PartialEq)]
pub struct Single<T> {
    value: Option<T>,
}

impl<T> Single<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for Single<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Destination for Single<T> {
    fn fill(&mut self, records: &Records) -> Result<()> {
        self.value = records.one()?;
        Ok(())
    }
}

/// A destination expecting a list of objects
#[derive(Debug, Clone, PartialEq)]
pub struct List<T> {
    value: Option<Vec<T>>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn get(&self) -> Option<&[T]> {
        self.value.as_deref()
    }

    pub fn into_inner(self) -> Option<Vec<T>> {
        self.value
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Destination for List<T> {
    fn fill(&mut self, records: &Records) -> Result<()> {
        self.value = records.list()?;
        Ok(())
    }
}
