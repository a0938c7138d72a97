//! Step kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the engine executes a step.
///
/// `Transition`, `Check` and `Query` come from the caller. `Retry` is reserved
/// for the synthetic steps the engine builds around runs of retriable steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Changes the world. Never retried.
    Transition,
    /// Asserts a condition. Eligible for retry.
    Check,
    /// Reads state into the world. Eligible for retry.
    Query,
    /// A bounded-retry group of consecutive checks and queries.
    Retry,
}

impl StepKind {
    /// Whether consecutive steps of this kind are grouped under a retry loop.
    pub fn is_retriable(self) -> bool {
        matches!(self, StepKind::Check | StepKind::Query)
    }

    /// Lowercase tag used in log fields and output lines.
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Transition => "transition",
            StepKind::Check => "check",
            StepKind::Query => "query",
            StepKind::Retry => "retry",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_kinds() {
        assert!(StepKind::Check.is_retriable());
        assert!(StepKind::Query.is_retriable());
        assert!(!StepKind::Transition.is_retriable());
        assert!(!StepKind::Retry.is_retriable());
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&StepKind::Transition).unwrap();
        assert_eq!(json, "\"transition\"");
        let parsed: StepKind = serde_json::from_str("\"query\"").unwrap();
        assert_eq!(parsed, StepKind::Query);
    }
}
