use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A check's assertion did not hold.
    Assertion,
    /// A transition or query returned something that is not a world map.
    InvalidWorld,
    /// The action's user code returned an error.
    ActionError,
    /// The action's user code panicked.
    ActionPanicked,
}

/// A failed step, carried as data through the flow.
///
/// `message` is the full diagnostic shown to the user when this is the first
/// failure of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Assertion, message)
    }
}

/// Failure reported by an assertion helper or a user check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AssertionError(pub String);

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for AssertionError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for AssertionError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Misuse of the engine API.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("step kind '{0}' is reserved for engine-built steps")]
    ReservedKind(String),

    #[error("invalid retry configuration: {0}")]
    InvalidRetryConfig(String),
}

/// Errors loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },
}

/// Errors from a check-result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}
