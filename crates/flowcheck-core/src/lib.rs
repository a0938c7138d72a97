//! Flow execution engine for flowcheck.
//!
//! Runs an ordered list of steps against a `World`, threading each step's
//! output into the next, stopping at the first failure:
//! - `step` -- step descriptors and the caller-side builders
//! - `grouper` -- wraps runs of consecutive checks/queries into retry groups
//! - `retry` -- the time-bounded retry loop
//! - `guard` -- converts panics in user code into failures
//! - `step_runner` -- executes one step and records diagnostics
//! - `runner` -- `FlowRunner`, the entry point
//! - `state` -- per-run counters, debug world snapshot and step log
//! - `clock`, `report` -- ports for time, output and check results
//!
//! A `FlowRunner` owns all mutable run state. Running flows concurrently on
//! one runner is not supported (`run_flow` takes `&mut self`); use one runner
//! per thread.

pub mod assertions;
pub mod clock;
pub mod grouper;
pub mod guard;
pub mod report;
pub mod retry;
pub mod runner;
pub mod state;
pub mod step;
pub mod step_runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use grouper::group_steps;
pub use report::{OutputSink, ResultStore};
pub use retry::RetryPolicy;
pub use runner::FlowRunner;
pub use step::{Step, StepContext};

pub use flowcheck_types::{
    Cid, EngineConfig, FailureKind, FlowOutcome, StepFailure, StepKind, World,
};
