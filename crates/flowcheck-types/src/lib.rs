//! Shared data types for the flowcheck flow engine.
//!
//! This crate holds the leaf data of the engine: the `World` threaded between
//! steps, step kinds, correlation ids, failure taxonomy, check records, run
//! reports and configuration.
//!
//! Zero engine logic -- only serde, uuid, chrono, thiserror.

pub mod cid;
pub mod config;
pub mod error;
pub mod outcome;
pub mod record;
pub mod step;
pub mod world;

pub use cid::Cid;
pub use config::{EngineConfig, RetryConfig};
pub use error::{AssertionError, ConfigError, EngineError, FailureKind, StepFailure, StoreError};
pub use outcome::{Counters, ExecutedStep, FlowOutcome};
pub use record::CheckRecord;
pub use step::StepKind;
pub use world::World;
