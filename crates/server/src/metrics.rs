//! Prometheus metrics for the status server.
//!
//! The registry exposes:
//! - HTTP request metrics (latency, counts, in flight)
//! - Engine gauges refreshed from the live status on every scrape
//! - Every core counter from [`ipobot_core::metrics`]

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ipobot_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ipobot_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ipobot_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics (collected dynamically)
// =============================================================================

/// Engine running (1) or stopped (0).
pub static ENGINE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ipobot_engine_running", "Whether the engine loop is running").unwrap()
});

/// Engine waiting on an operator reply.
pub static ENGINE_AWAITING_REPLY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ipobot_engine_awaiting_reply",
        "Whether the engine is waiting for an operator reply",
    )
    .unwrap()
});

/// Cycles started since boot.
pub static ENGINE_ITERATION: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ipobot_engine_iteration", "Engine cycles started since boot").unwrap()
});

/// Offerings in the latest unfilled set.
pub static PENDING_OFFERINGS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ipobot_pending_offerings",
        "Offerings with at least one unfilled user in the latest cycle",
    )
    .unwrap()
});

/// Register all metrics with the registry.
fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Engine
    registry.register(Box::new(ENGINE_RUNNING.clone())).unwrap();
    registry
        .register(Box::new(ENGINE_AWAITING_REPLY.clone()))
        .unwrap();
    registry.register(Box::new(ENGINE_ITERATION.clone())).unwrap();
    registry
        .register(Box::new(PENDING_OFFERINGS.clone()))
        .unwrap();

    // Core metrics (cycles, approval, portal, stores, notifications)
    for metric in ipobot_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh engine gauges from the current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.engine_status().await;
    ENGINE_RUNNING.set(i64::from(status.running));
    ENGINE_AWAITING_REPLY.set(i64::from(status.awaiting_reply));
    ENGINE_ITERATION.set(status.iteration as i64);
    PENDING_OFFERINGS.set(status.pending.len() as i64);
}
