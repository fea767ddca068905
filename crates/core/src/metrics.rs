//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Engine cycles and their outcomes
//! - Approval replies
//! - Portal probes and application outcomes
//! - Store and notification failures

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

use crate::store::StoreError;

// =============================================================================
// Engine
// =============================================================================

/// Engine cycles by outcome.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_cycles_total", "Total engine cycles"),
        &["outcome"], // "no_offerings", "none_eligible", "nothing_unfilled", "no_reply", "ignored", "applied", "no_match", "error"
    )
    .unwrap()
});

/// Engine cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("ipobot_cycle_duration_seconds", "Duration of an engine cycle")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Approval
// =============================================================================

/// Operator replies by interpretation.
pub static APPROVAL_REPLIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_approval_replies_total", "Operator replies received"),
        &["kind"], // "select", "ignore", "no_match", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Portal
// =============================================================================

/// Portal probe sessions by purpose and result.
pub static PROBES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_probes_total", "Portal probe sessions"),
        &["purpose", "result"], // purpose: "sync", "apply"; result: "ok", "failed"
    )
    .unwrap()
});

/// Per-user application outcomes.
pub static APPLICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_applications_total", "Per-user application outcomes"),
        &["result"], // "applied", "already_applied", "failed", "dry_run"
    )
    .unwrap()
});

// =============================================================================
// Side effects
// =============================================================================

/// State document failures by store and kind.
pub static STORE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_store_errors_total", "State document failures"),
        &["store", "kind"], // kind: "read", "parse", "write"
    )
    .unwrap()
});

/// Outbound notifications by result.
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_notifications_total", "Outbound notifications"),
        &["result"], // "sent", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Count a store failure.
pub fn record_store_error(store: &str, error: &StoreError) {
    let kind = match error {
        StoreError::Read { .. } => "read",
        StoreError::Parse { .. } => "parse",
        StoreError::Write { .. } => "write",
    };
    STORE_ERRORS.with_label_values(&[store, kind]).inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(APPROVAL_REPLIES.clone()),
        Box::new(PROBES_TOTAL.clone()),
        Box::new(APPLICATIONS_TOTAL.clone()),
        Box::new(STORE_ERRORS.clone()),
        Box::new(NOTIFICATIONS.clone()),
    ]
}
