//! Ports to the outside world: the human-readable output channel and the
//! external check-result store.
//!
//! Concrete adapters live in `flowcheck-infra`. The impls for `Vec` below
//! are the minimal in-process versions.

use flowcheck_types::{CheckRecord, StoreError};
use serde_json::{Map, Value};

/// Primary human-readable output channel.
pub trait OutputSink: Send {
    fn write_line(&mut self, line: &str);
}

/// External store of check results.
pub trait ResultStore: Send {
    /// Append a check result.
    fn record(&mut self, record: CheckRecord) -> Result<(), StoreError>;

    /// Merge `metadata` into the most recently recorded result.
    ///
    /// Returns `false` when the store holds no results.
    fn patch_last(&mut self, metadata: &Map<String, Value>) -> Result<bool, StoreError>;

    /// All results recorded so far, oldest first.
    fn records(&self) -> Result<Vec<CheckRecord>, StoreError>;
}

impl OutputSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl ResultStore for Vec<CheckRecord> {
    fn record(&mut self, record: CheckRecord) -> Result<(), StoreError> {
        self.push(record);
        Ok(())
    }

    fn patch_last(&mut self, metadata: &Map<String, Value>) -> Result<bool, StoreError> {
        match self.last_mut() {
            Some(last) => {
                last.apply_patch(metadata);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn records(&self) -> Result<Vec<CheckRecord>, StoreError> {
        Ok(self.clone())
    }
}
