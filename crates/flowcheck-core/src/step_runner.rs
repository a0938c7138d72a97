//! Executes one step against the current world.
//!
//! `StepRunner::run_step` is the fold operator of a flow run: it returns the
//! next world on success and the failure otherwise, which stops the fold.
//! This is the only place where panics from user code are caught and turned
//! into failures.

use flowcheck_types::{CheckRecord, Cid, ExecutedStep, FailureKind, StepFailure, StepKind, World};

use crate::clock::Clock;
use crate::guard::{self, CaughtPanic};
use crate::report::OutputSink;
use crate::retry::{self, AttemptState};
use crate::state::{RunCheckpoint, RunState};
use crate::step::{ActionFn, RetryGroup, Step, StepAction, StepContext};

/// Borrowed view of a flow runner while a run is in progress.
pub struct StepRunner<'a> {
    clock: &'a dyn Clock,
    sink: &'a mut dyn OutputSink,
    verbose: bool,
    state: &'a mut RunState,
    /// Retry groups currently open around the step being run.
    group_depth: u32,
}

impl<'a> StepRunner<'a> {
    pub fn new(
        clock: &'a dyn Clock,
        sink: &'a mut dyn OutputSink,
        verbose: bool,
        state: &'a mut RunState,
    ) -> Self {
        Self {
            clock,
            sink,
            verbose,
            state,
            group_depth: 0,
        }
    }

    /// Run `step` on `world` under a fresh child of `parent`.
    pub fn run_step(&mut self, world: &World, step: &Step, parent: &Cid) -> Result<World, StepFailure> {
        let cid = parent.child();
        let span = tracing::debug_span!("step", cid = %cid, step_type = %step.kind());
        let _entered = span.enter();

        tracing::debug!(
            log = "step-start",
            step_type = %step.kind(),
            step_desc = step.description(),
            cid = %cid,
            "running step"
        );

        let started = self.clock.now();
        let result = match step.action() {
            StepAction::Run(action) => self.invoke(step, action, world, &cid),
            StepAction::Retry(group) => self.run_group(group, world, &cid),
        };
        let elapsed = self.clock.now().saturating_sub(started);

        // Group members record their own worlds.
        if step.kind() != StepKind::Retry {
            self.state.record_world(step.description(), result.as_ref().ok());
        }
        self.state.executed.push(ExecutedStep {
            kind: step.kind(),
            description: step.description().to_string(),
            cid: cid.clone(),
            ok: result.is_ok(),
            elapsed,
        });

        if let Err(failure) = &result {
            tracing::debug!(
                log = "step-failed",
                step_type = %step.kind(),
                step_desc = step.description(),
                cid = %cid,
                failure_kind = ?failure.kind,
                "step failed"
            );
        }
        if self.verbose {
            let status = if result.is_ok() { "ok" } else { "failed" };
            self.state
                .pending_lines
                .push(format!("{} {}: {status}", step.kind(), step.description()));
            // Lines from inside a group wait for the group, so discarded
            // attempts never reach the sink.
            if self.group_depth == 0 {
                for line in self.state.pending_lines.drain(..) {
                    self.sink.write_line(&line);
                }
            }
        }

        result
    }

    /// Invoke a leaf action inside the panic guard and update the counters.
    fn invoke(&mut self, step: &Step, action: &ActionFn, world: &World, cid: &Cid) -> Result<World, StepFailure> {
        let ctx = StepContext {
            cid,
            description: step.description(),
            kind: step.kind(),
            location: step.location(),
        };

        let result = guard::catch(|| action(&ctx, world)).unwrap_or_else(|caught| Err(panic_failure(&ctx, caught)));

        match &result {
            Ok(_) if step.kind() == StepKind::Check => self.state.counters.passes += 1,
            Ok(_) => {}
            Err(_) => self.state.counters.failures += 1,
        }

        if step.kind() == StepKind::Check {
            self.state.pending_records.push(CheckRecord::new(
                step.description(),
                result.is_ok(),
                result.as_ref().err().map(|f| f.message.clone()),
                cid.clone(),
            ));
        }

        result
    }

    /// Run a retry group: its members in order, retried as a unit.
    fn run_group(&mut self, group: &RetryGroup, world: &World, cid: &Cid) -> Result<World, StepFailure> {
        let clock = self.clock;
        self.group_depth += 1;
        let outcome = retry::retry(clock, group.policy(), self, |runner, attempt| {
            let attempt_cid = cid.child();
            tracing::debug!(
                log = "retry-attempt",
                attempt,
                cid = %attempt_cid,
                "running retry attempt"
            );
            group
                .steps()
                .iter()
                .try_fold(world.clone(), |current, member| {
                    runner.run_step(&current, member, &attempt_cid)
                })
        });
        self.group_depth -= 1;

        if let Err(failure) = &outcome.result {
            tracing::warn!(
                log = "retry-exhausted",
                attempts = outcome.attempts,
                cid = %cid,
                failure_kind = ?failure.kind,
                "retry budget exhausted"
            );
        }
        outcome.result
    }
}

impl AttemptState for StepRunner<'_> {
    type Checkpoint = RunCheckpoint;

    fn checkpoint(&self) -> RunCheckpoint {
        self.state.checkpoint()
    }

    fn restore(&mut self, checkpoint: &RunCheckpoint) {
        self.state.restore(checkpoint);
    }
}

/// Panics in checks are assertion failures; elsewhere they are faults.
fn panic_failure(ctx: &StepContext<'_>, caught: CaughtPanic) -> StepFailure {
    let kind = if ctx.kind == StepKind::Check {
        FailureKind::Assertion
    } else {
        FailureKind::ActionPanicked
    };
    let raised_at = caught.location.as_deref().unwrap_or("unknown location");
    StepFailure::new(
        kind,
        format!(
            "{} `{}` ({}) panicked: {}\n  raised at {raised_at}\nstack trace:\n{}",
            ctx.kind, ctx.description, ctx.location, caught.message, caught.backtrace
        ),
    )
}
