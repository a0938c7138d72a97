//! Small assertion helpers for `Step::check` closures.
//!
//! Keys are dotted paths resolved with `World::get_path`.

use flowcheck_types::{AssertionError, World};
use serde_json::Value;

/// Assert that `key` holds `expected`.
pub fn expect_eq(world: &World, key: &str, expected: impl Into<Value>) -> Result<(), AssertionError> {
    let expected = expected.into();
    match world.get_path(key) {
        Some(actual) if *actual == expected => Ok(()),
        Some(actual) => Err(AssertionError::new(format!(
            "{key}: expected {expected}, got {actual}"
        ))),
        None => Err(AssertionError::new(format!(
            "{key}: expected {expected}, got nothing"
        ))),
    }
}

/// Assert that `key` is present and not null.
pub fn expect_present(world: &World, key: &str) -> Result<(), AssertionError> {
    match world.get_path(key) {
        Some(Value::Null) | None => Err(AssertionError::new(format!("{key}: expected a value, got nothing"))),
        Some(_) => Ok(()),
    }
}

/// Assert an arbitrary condition.
pub fn expect_that(condition: bool, message: impl Into<String>) -> Result<(), AssertionError> {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_eq_mismatch_message() {
        let world = World::new().with("count", 1);
        let err = expect_eq(&world, "count", 2).unwrap_err();
        assert_eq!(err.to_string(), "count: expected 2, got 1");
    }

    #[test]
    fn test_expect_eq_missing_key() {
        let err = expect_eq(&World::new(), "count", 2).unwrap_err();
        assert_eq!(err.to_string(), "count: expected 2, got nothing");
    }

    #[test]
    fn test_expect_eq_nested() {
        let world = World::new().with("user", json!({ "name": "ana" }));
        assert!(expect_eq(&world, "user.name", "ana").is_ok());
    }

    #[test]
    fn test_expect_present() {
        let world = World::new().with("a", 1).with("b", Value::Null);
        assert!(expect_present(&world, "a").is_ok());
        assert!(expect_present(&world, "b").is_err());
        assert!(expect_present(&world, "c").is_err());
    }

    #[test]
    fn test_expect_that() {
        assert!(expect_that(true, "unused").is_ok());
        assert_eq!(expect_that(false, "too small").unwrap_err().0, "too small");
    }
}
