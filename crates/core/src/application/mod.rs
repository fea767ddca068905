//! Application orchestration.

mod orchestrator;
mod report;

pub use orchestrator::{names_match, ApplicationOrchestrator, OrchestratorSettings, SyncReport};
pub use report::{ApplicationReport, UserOutcome, UserResult};
