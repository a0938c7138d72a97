//! Check results handed to the external result store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cid::Cid;

/// Outcome of one executed check, as reported to the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Description of the check step.
    pub description: String,
    /// Whether the assertion held.
    pub passed: bool,
    /// Assertion diagnostic when `passed` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Cid of the step that produced the record.
    pub cid: Cid,
    pub recorded_at: DateTime<Utc>,
    /// Free-form metadata; the engine patches the flow cid in here.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl CheckRecord {
    pub fn new(description: impl Into<String>, passed: bool, message: Option<String>, cid: Cid) -> Self {
        Self {
            description: description.into(),
            passed,
            message,
            cid,
            recorded_at: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Merge `patch` into the metadata, overwriting existing keys.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}
