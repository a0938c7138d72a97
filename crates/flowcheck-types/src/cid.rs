//! Correlation ids for log correlation across a flow run.
//!
//! A cid is a dot-separated path of random segments: the flow gets a root
//! (`FLOW.3F9A0C1B7E2D`), every step a child (`FLOW.3F9A0C1B7E2D.A41C09E5B3F7`),
//! and so on. Each segment carries 48 random bits, so ids minted across a
//! large suite do not collide in practice.
//! Cids are only ever read for logging and reporting.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of cids minted by the engine when no parent cid is supplied.
pub const ROOT_PREFIX: &str = "FLOW";

const SEGMENT_LEN: usize = 12;

/// A hierarchical correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Mint a new root cid (`FLOW.<segment>`).
    pub fn new_root() -> Self {
        Self(format!("{ROOT_PREFIX}.{}", segment()))
    }

    /// Wrap an existing id (e.g. one received from an upstream caller).
    pub fn from_existing(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a child scope under this cid.
    pub fn child(&self) -> Self {
        Self(format!("{}.{}", self.0, segment()))
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<Cid> {
        self.0.rsplit_once('.').map(|(parent, _)| Cid(parent.to_string()))
    }

    /// Whether `self` is `other` or nested somewhere below it.
    pub fn descends_from(&self, other: &Cid) -> bool {
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0[other.0.len()..].starts_with('.'))
    }

    /// Number of segments in the path.
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn segment() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..SEGMENT_LEN].to_uppercase()
}
