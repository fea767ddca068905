//! In-process test fixture for the status API.
//!
//! Builds the real router over temp-dir stores, a [`MockCatalog`] and a
//! shared engine status handle the test can mutate directly.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use ipobot_core::testing::MockCatalog;
use ipobot_core::{load_config_from_str, EngineStatus, IgnoreStore, StatusStore};
use ipobot_server::api::create_router;
use ipobot_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ipobot_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[telegram]
bot_token = "123456:secret-token"
chat_id = "1000"

[[users]]
alias = "A"
dp_id = "13700"
username = "1234"
password = "hunter2"
crn = "CRN-A"
txn_pin = "1111"

[[users]]
alias = "B"
dp_id = "13700"
username = "5678"
password = "hunter3"
crn = "CRN-B"
txn_pin = "2222"
"#;

pub struct TestFixture {
    pub router: Router,
    pub catalog: Arc<MockCatalog>,
    pub engine_status: Arc<RwLock<EngineStatus>>,
    pub status_store: Arc<StatusStore>,
    pub ignore_store: Arc<IgnoreStore>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");

        let catalog = Arc::new(MockCatalog::new());
        let engine_status = Arc::new(RwLock::new(EngineStatus::default()));
        let status_store = Arc::new(StatusStore::open(temp_dir.path().join("status.json")));
        let ignore_store = Arc::new(IgnoreStore::open(temp_dir.path().join("ignore.json")));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&engine_status),
            Arc::clone(&status_store),
            Arc::clone(&ignore_store),
            Arc::clone(&catalog) as Arc<dyn ipobot_core::OfferingCatalog>,
        ));

        Self {
            router: create_router(state),
            catalog,
            engine_status,
            status_store,
            ignore_store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }
}
