//! Run reports produced by the flow runner.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cid::Cid;
use crate::step::StepKind;
use crate::world::World;

/// Pass/fail bookkeeping for one flow run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Checks that held.
    pub passes: u32,
    /// Failures captured (assertions, invalid worlds, action errors and panics).
    pub failures: u32,
}

/// One executed step in a run, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedStep {
    pub kind: StepKind,
    pub description: String,
    pub cid: Cid,
    pub ok: bool,
    pub elapsed: Duration,
}

/// Result of a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOutcome {
    /// Flow description as given by the caller.
    pub description: String,
    pub success: bool,
    /// Final world; `None` when a step failed.
    pub world: Option<World>,
    /// Diagnostic of the first failing step; empty on success.
    pub diagnostic: String,
    /// Root cid of the run.
    pub cid: Cid,
    pub counters: Counters,
    pub executed: Vec<ExecutedStep>,
    pub elapsed: Duration,
}

impl FlowOutcome {
    /// The `(success, diagnostic)` pair.
    pub fn verdict(&self) -> (bool, String) {
        (self.success, self.diagnostic.clone())
    }
}
