//! Engine configuration types.
//!
//! `EngineConfig` is what `flowcheck.toml` deserializes into. All fields have
//! defaults, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retry budget for groups of checks and queries.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Also write one line per executed step to the output sink.
    #[serde(default)]
    pub verbose: bool,
}

/// Timing of the bounded retry loop, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total time budget for one retry group (default 300).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between attempts (default 10).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    300
}

fn default_interval_ms() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// A zero interval would let the loop spin without ever consuming budget.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.interval_ms == 0 {
            return Err(EngineError::InvalidRetryConfig(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
