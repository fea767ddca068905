//! Status API tests over the in-process router.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use common::{fixtures, TestFixture};
use ipobot_core::{CatalogError, CycleOutcome};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_redacts_secrets() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["telegram"]["chat_id"], "1000");
    assert_eq!(response.body["telegram"]["bot_token_configured"], true);
    assert_eq!(response.body["users"], serde_json::json!(["A", "B"]));
    assert_eq!(response.body["engine"]["timezone"], "Asia/Kathmandu");
    assert!(!response.text.contains("secret-token"));
    assert!(!response.text.contains("hunter2"));
    assert!(!response.text.contains("CRN-A"));
}

#[tokio::test]
async fn test_status_reflects_engine_snapshot() {
    let fixture = TestFixture::new();
    {
        let mut status = fixture.engine_status.write().await;
        status.running = true;
        status.iteration = 7;
        status.last_outcome = Some(CycleOutcome::NoReply);
        status.pending = vec![fixtures::unfilled("1", "Alpha Corp", &["A", "B"])];
    }

    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["running"], true);
    assert_eq!(response.body["iteration"], 7);
    assert_eq!(response.body["last_outcome"]["kind"], "no_reply");
    assert_eq!(response.body["pending"][0]["id"], "1");
    assert_eq!(
        response.body["pending"][0]["unfilled_users"],
        serde_json::json!(["A", "B"])
    );
}

#[tokio::test]
async fn test_state_on_fresh_install_is_empty() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/state").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], serde_json::json!({}));
    assert_eq!(response.body["ignored"], serde_json::json!({}));
    assert_eq!(response.body["active_ignores"], serde_json::json!([]));
}

#[tokio::test]
async fn test_state_reports_documents_and_active_ignores() {
    let fixture = TestFixture::new();
    assert!(fixture.status_store.mark_filled("1", "A"));
    let now = Utc::now();
    assert!(fixture.ignore_store.ignore_at("2", Duration::hours(24), now).is_some());
    assert!(fixture
        .ignore_store
        .ignore_at("3", Duration::hours(1), now - Duration::hours(2))
        .is_some());

    let response = fixture.get("/api/v1/state").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"]["1"]["A"], true);
    assert!(response.body["ignored"]["2"]["until"].is_string());
    assert!(response.body["ignored"]["3"]["until"].is_string());
    assert_eq!(response.body["active_ignores"], serde_json::json!(["2"]));
}

#[tokio::test]
async fn test_offerings_lists_live_catalog() {
    let fixture = TestFixture::new();
    fixture
        .catalog
        .set_offerings(vec![
            fixtures::offering("1", "Alpha Corp"),
            fixtures::offering("2", "Beta Hydro"),
        ])
        .await;

    let response = fixture.get("/api/v1/offerings").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["source"], "mock");
    assert_eq!(response.body["total"], 2);
    assert_eq!(response.body["offerings"][0]["company_name"], "Alpha Corp");
    assert_eq!(fixture.catalog.fetch_count().await, 1);
}

#[tokio::test]
async fn test_offerings_catalog_failure_is_bad_gateway() {
    let fixture = TestFixture::new();
    fixture.catalog.set_next_error(CatalogError::Timeout).await;

    let response = fixture.get("/api/v1/offerings").await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "Request timeout");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.engine_status.write().await.running = true;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("text/plain")));
    assert!(response.text.contains("ipobot_http_requests_total"));
    assert!(response.text.contains("/api/v1/health"));
    assert!(response.text.contains("ipobot_engine_running 1"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/unknown").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
