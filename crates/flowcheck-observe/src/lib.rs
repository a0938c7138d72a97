//! Observability setup for processes that run flowcheck flows.
//!
//! The engine itself only emits `tracing` events and spans; this crate
//! installs the subscriber that renders or exports them.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing, TracingOptions};
