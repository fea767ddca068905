//! Engine status, persisted state and live catalog handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use ipobot_core::store::{IgnoreDocument, StatusDocument};
use ipobot_core::{EngineStatus, Offering};

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub status: StatusDocument,
    pub ignored: IgnoreDocument,
    /// Ignore records still in force at request time.
    pub active_ignores: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferingsResponse {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub offerings: Vec<Offering>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/status
///
/// Latest engine snapshot.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<EngineStatus> {
    Json(state.engine_status().await)
}

/// GET /api/v1/state
///
/// Both persisted documents as currently on disk.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let now = Utc::now();
    let status = state.status_store().snapshot();
    let ignored = state.ignore_store().snapshot();
    let active_ignores = ignored
        .iter()
        .filter(|(_, record)| record.is_active(now))
        .map(|(id, _)| id.clone())
        .collect();

    Json(StateResponse {
        status,
        ignored,
        active_ignores,
    })
}

/// GET /api/v1/offerings
///
/// Fetch the catalog live. Upstream failures map to 502.
pub async fn list_offerings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OfferingsResponse>, impl IntoResponse> {
    let catalog = state.catalog();

    match catalog.fetch().await {
        Ok(offerings) => Ok(Json(OfferingsResponse {
            source: catalog.name().to_string(),
            fetched_at: Utc::now(),
            total: offerings.len(),
            offerings,
        })),
        Err(e) => {
            warn!(source = catalog.name(), "Catalog fetch for API failed: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
