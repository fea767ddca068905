//! Types for the polling engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::{ApplicationReport, SyncReport};
use crate::catalog::CatalogError;
use crate::offering::UnfilledOffering;

/// Errors that end a cycle early. The loop logs them and backs off.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("unknown time zone: {0}")]
    UnknownTimezone(String),
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The catalog listed nothing.
    NoOfferings,
    /// Nothing is open for application today.
    NoneEligible,
    /// Every eligible offering is filled or ignored.
    NothingUnfilled,
    /// The operator did not reply in time.
    NoReply,
    /// The operator deferred an offering.
    Ignored { offering_id: String },
    /// The operator's reply matched nothing.
    NoMatch { reply: String },
    /// Applications were attempted for the selected offering.
    Applied { report: ApplicationReport },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::NoOfferings => "no_offerings",
            CycleOutcome::NoneEligible => "none_eligible",
            CycleOutcome::NothingUnfilled => "nothing_unfilled",
            CycleOutcome::NoReply => "no_reply",
            CycleOutcome::Ignored { .. } => "ignored",
            CycleOutcome::NoMatch { .. } => "no_match",
            CycleOutcome::Applied { .. } => "applied",
        }
    }
}

/// Snapshot of the engine served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    /// Cycles started since boot.
    pub iteration: u64,
    pub dry_run: bool,
    /// Waiting on an operator reply right now.
    pub awaiting_reply: bool,
    pub last_cycle_started_at: Option<DateTime<Utc>>,
    pub last_cycle_finished_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<CycleOutcome>,
    pub last_error: Option<String>,
    /// Unfilled set computed by the latest cycle.
    pub pending: Vec<UnfilledOffering>,
    /// Latest availability pre-sync, if one ran.
    pub last_sync: Option<SyncSummary>,
}

/// Serializable digest of a [`SyncReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub at: Option<DateTime<Utc>>,
    pub probed: Vec<String>,
    pub failed: Vec<String>,
    pub marked: Vec<String>,
}

impl SyncSummary {
    pub fn new(report: SyncReport, at: DateTime<Utc>) -> Self {
        Self {
            at: Some(at),
            probed: report.probed,
            failed: report.failed,
            marked: report.marked,
        }
    }
}
