//! Polling engine.
//!
//! Each cycle sweeps expired ignore records, fetches the catalog, keeps the
//! offerings open today, optionally probes every user to reconcile local
//! state, resolves the unfilled set and, if anything is outstanding, runs one
//! approval round and acts on the decision. Cycles run one after another on
//! a single task; a shutdown signal stops the loop between cycles.

mod config;
mod runner;
mod types;

pub use config::{EngineConfig, EngineTiming};
pub use runner::{EngineContext, EngineSettings, IpoEngine};
pub use types::{CycleOutcome, EngineError, EngineStatus, SyncSummary};
