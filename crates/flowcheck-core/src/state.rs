//! Mutable bookkeeping for one flow run.
//!
//! Owned by the `FlowRunner` and reset at the start of every run. Nothing in
//! here feeds back into control flow.

use std::collections::BTreeMap;

use flowcheck_types::{CheckRecord, Counters, ExecutedStep, World};

use crate::retry::AttemptState;

#[derive(Debug, Default)]
pub struct RunState {
    pub counters: Counters,
    /// Debug snapshot: world observed after each executed step, keyed by
    /// description. `None` marks a failed step. Last write wins.
    pub worlds: BTreeMap<String, Option<World>>,
    /// Executed steps in order.
    pub executed: Vec<ExecutedStep>,
    /// Check results, flushed to the result store when the flow finishes.
    pub pending_records: Vec<CheckRecord>,
    /// Verbose lines held back until the enclosing retry group settles.
    pub pending_lines: Vec<String>,
}

/// Rollback point taken before a retry group's first attempt.
#[derive(Debug, Clone)]
pub struct RunCheckpoint {
    counters: Counters,
    worlds: BTreeMap<String, Option<World>>,
    executed: usize,
    pending_records: usize,
    pending_lines: usize,
}

impl RunState {
    pub fn record_world(&mut self, description: &str, world: Option<&World>) {
        self.worlds.insert(description.to_string(), world.cloned());
    }
}

impl AttemptState for RunState {
    type Checkpoint = RunCheckpoint;

    fn checkpoint(&self) -> RunCheckpoint {
        RunCheckpoint {
            counters: self.counters,
            worlds: self.worlds.clone(),
            executed: self.executed.len(),
            pending_records: self.pending_records.len(),
            pending_lines: self.pending_lines.len(),
        }
    }

    fn restore(&mut self, checkpoint: &RunCheckpoint) {
        self.counters = checkpoint.counters;
        self.worlds.clone_from(&checkpoint.worlds);
        self.executed.truncate(checkpoint.executed);
        self.pending_records.truncate(checkpoint.pending_records);
        self.pending_lines.truncate(checkpoint.pending_lines);
    }
}
