//! The flow runner: entry point of the engine.
//!
//! # Execution flow
//!
//! 1. Reset per-run state (counters, debug snapshot, step log).
//! 2. Mint the flow cid (a child of the parent cid when one is configured).
//! 3. Group runs of checks and queries into retry groups.
//! 4. Fold the step runner over the grouped steps, seeded with an empty world.
//!    The first failure stops the fold.
//! 5. On failure, write the diagnostic to the output sink.
//! 6. Flush check records to the result store and patch the last one with
//!    the flow cid.

use std::collections::BTreeMap;
use std::sync::Arc;

use flowcheck_types::{Cid, Counters, EngineConfig, EngineError, FlowOutcome, World};
use serde_json::{json, Map};

use crate::clock::{Clock, SystemClock};
use crate::grouper::group_steps;
use crate::report::{OutputSink, ResultStore};
use crate::retry::RetryPolicy;
use crate::state::RunState;
use crate::step::Step;
use crate::step_runner::StepRunner;

/// Runs flows and owns everything a run mutates.
///
/// Not meant to be shared between threads while a flow runs; create one
/// runner per thread instead.
pub struct FlowRunner {
    config: EngineConfig,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    sink: Box<dyn OutputSink>,
    results: Box<dyn ResultStore>,
    parent_cid: Option<Cid>,
    state: RunState,
}

impl FlowRunner {
    /// Create a runner using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRetryConfig`] if the retry interval is zero.
    pub fn new(
        config: EngineConfig,
        sink: Box<dyn OutputSink>,
        results: Box<dyn ResultStore>,
    ) -> Result<Self, EngineError> {
        let policy = RetryPolicy::from_config(&config.retry)?;
        Ok(Self {
            config,
            policy,
            clock: Arc::new(SystemClock::new()),
            sink,
            results,
            parent_cid: None,
            state: RunState::default(),
        })
    }

    /// Use a different time source (e.g. `ManualClock` in tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Nest every flow cid under `cid` instead of minting a new root.
    pub fn with_parent_cid(mut self, cid: Cid) -> Self {
        self.parent_cid = Some(cid);
        self
    }

    /// World observed after each step of the last run, keyed by description.
    ///
    /// For retried groups only the final attempt's entries are kept, so the
    /// keys match the leaf steps listed in `FlowOutcome::executed`.
    pub fn debug_worlds(&self) -> &BTreeMap<String, Option<World>> {
        &self.state.worlds
    }

    /// Counters of the last run.
    pub fn counters(&self) -> Counters {
        self.state.counters
    }

    pub fn results(&self) -> &dyn ResultStore {
        self.results.as_ref()
    }

    /// Run `steps` in order and report the verdict.
    pub fn run_flow(&mut self, description: &str, steps: Vec<Step>) -> FlowOutcome {
        self.state = RunState::default();

        let cid = self
            .parent_cid
            .as_ref()
            .map_or_else(Cid::new_root, Cid::child);
        let span = tracing::info_span!("flow", cid = %cid, flow = description);
        let _entered = span.enter();

        tracing::info!(
            log = "flow-start",
            flow = description,
            cid = %cid,
            steps = steps.len(),
            "flow started"
        );

        let grouped = group_steps(steps, &self.policy);
        let started = self.clock.now();
        let result = {
            let mut runner = StepRunner::new(
                self.clock.as_ref(),
                self.sink.as_mut(),
                self.config.verbose,
                &mut self.state,
            );
            grouped
                .iter()
                .try_fold(World::new(), |world, step| runner.run_step(&world, step, &cid))
        };
        let elapsed = self.clock.now().saturating_sub(started);

        let (world, diagnostic) = match result {
            Ok(world) => (Some(world), String::new()),
            Err(failure) => {
                self.sink.write_line(&failure.message);
                (None, failure.message)
            }
        };
        let success = world.is_some();

        self.publish_results(description, &cid);

        tracing::info!(
            log = "flow-finish",
            flow = description,
            cid = %cid,
            success,
            passes = self.state.counters.passes,
            failures = self.state.counters.failures,
            elapsed_ms = elapsed.as_millis() as u64,
            "flow finished"
        );

        FlowOutcome {
            description: description.to_string(),
            success,
            world,
            diagnostic,
            cid,
            counters: self.state.counters,
            executed: self.state.executed.clone(),
            elapsed,
        }
    }

    /// Hand this run's check records to the store and tag the last one with
    /// the flow cid. Store errors are logged, never fatal to the verdict.
    fn publish_results(&mut self, description: &str, cid: &Cid) {
        if self.state.pending_records.is_empty() {
            return;
        }
        for record in self.state.pending_records.drain(..) {
            if let Err(err) = self.results.record(record) {
                tracing::warn!(cid = %cid, error = %err, "failed to record check result");
            }
        }

        let mut patch = Map::new();
        patch.insert("cid".to_string(), json!(cid.as_str()));
        patch.insert("flow".to_string(), json!(description));
        if let Err(err) = self.results.patch_last(&patch) {
            tracing::warn!(cid = %cid, error = %err, "failed to attach flow cid to check result");
        }
    }
}
