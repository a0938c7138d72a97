//! The opaque state value threaded through a flow.
//!
//! A `World` is a JSON object. Steps never mutate it in place: each successful
//! transition produces a new `World` that replaces the previous one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value state passed from one step to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct World(Map<String, Value>);

impl World {
    /// Create an empty world (the seed of every flow).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolve a dotted path such as `user.address.city`.
    ///
    /// Array elements can be addressed by index (`items.0.name`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Return a copy of this world with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.0.clone();
        next.insert(key.into(), value.into());
        Self(next)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the world holds no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into a JSON value (always an object).
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for World {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Only JSON objects are valid worlds; anything else is handed back as the error.
impl TryFrom<Value> for World {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
