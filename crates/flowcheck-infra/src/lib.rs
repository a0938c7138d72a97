//! Adapters for the flowcheck engine.
//!
//! - `config` -- loads `EngineConfig` from `flowcheck.toml` plus env overrides
//! - `output` -- `OutputSink` implementations (stdout, in-memory capture)
//! - `results` -- `ResultStore` implementations (in-memory, JSON Lines file)

pub mod config;
pub mod output;
pub mod results;

pub use config::load_engine_config;
pub use output::{MemorySink, StdoutSink};
pub use results::{InMemoryResultStore, JsonlResultStore};
