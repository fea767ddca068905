//! Engine lifecycle integration tests.
//!
//! These tests drive complete cycles over mock collaborators:
//! catalog -> eligibility -> availability sync -> unfilled set -> approval -> application

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use ipobot_core::{
    catalog::CatalogError,
    engine::EngineTiming,
    testing::{fixtures, MockCatalog, MockNotifier, MockPortal, PortalStage},
    CycleOutcome, EngineConfig, EngineContext, EngineSettings, IgnoreStore, IpoEngine,
    StatusStore, UserOutcome,
};

/// Test helper owning the stores and mocks behind one engine.
struct TestHarness {
    status: Arc<StatusStore>,
    ignore: Arc<IgnoreStore>,
    catalog: Arc<MockCatalog>,
    portal: Arc<MockPortal>,
    notifier: Arc<MockNotifier>,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let status = Arc::new(StatusStore::open(temp_dir.path().join("ipo_status.json")));
        let ignore = Arc::new(IgnoreStore::open(temp_dir.path().join("ipo_ignore.json")));
        let catalog = Arc::new(MockCatalog::with_offerings(vec![fixtures::offering(
            "1",
            "Alpha Corp",
        )]));
        let portal = Arc::new(MockPortal::new());
        portal
            .set_open_issues(vec![fixtures::open_issue(1, "Alpha Corp")])
            .await;

        Self {
            status,
            ignore,
            catalog,
            portal,
            notifier: Arc::new(MockNotifier::new()),
            _temp_dir: temp_dir,
        }
    }

    fn settings(&self, engine: EngineConfig) -> EngineSettings {
        EngineSettings {
            engine,
            timing: EngineTiming {
                check_interval: Duration::from_millis(10),
                error_backoff: Duration::from_millis(10),
                reply_timeout: Duration::from_millis(80),
                reply_poll_interval: Duration::from_millis(5),
            },
            users: vec![fixtures::user("A"), fixtures::user("B")],
            login_attempts: 3,
        }
    }

    fn engine_with(&self, engine: EngineConfig) -> IpoEngine {
        let ctx = EngineContext {
            catalog: self.catalog.clone(),
            portal: self.portal.clone(),
            notifier: self.notifier.clone(),
            replies: self.notifier.clone(),
            status_store: self.status.clone(),
            ignore_store: self.ignore.clone(),
        };
        IpoEngine::new(self.settings(engine), ctx).expect("Failed to create engine")
    }

    fn engine(&self) -> IpoEngine {
        self.engine_with(EngineConfig::default())
    }

    async fn assert_sessions_closed(&self) {
        assert_eq!(
            self.portal.sessions_opened().await,
            self.portal.sessions_closed().await,
            "every portal session must be closed"
        );
    }
}

fn applied_report(outcome: CycleOutcome) -> ipobot_core::ApplicationReport {
    match outcome {
        CycleOutcome::Applied { report } => report,
        other => panic!("expected an applied outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_state_announces_all_users() {
    let h = TestHarness::new().await;
    let mut engine = h.engine();

    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoReply);
    let status = engine.status_handle().read().await.clone();
    assert_eq!(status.pending.len(), 1);
    assert_eq!(status.pending[0].id(), "1");
    assert_eq!(status.pending[0].unfilled_users, vec!["A", "B"]);

    let sent = h.notifier.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Alpha Corp (ID: 1) | Unfilled users: A, B"));

    // No local state yet, so every user was probed first.
    assert_eq!(h.portal.sessions_opened().await, 2);
    assert!(status.last_sync.is_some());
    assert!(h.portal.applications().await.is_empty());
    h.assert_sessions_closed().await;
}

#[tokio::test]
async fn test_filled_user_is_not_announced() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "A");
    let mut engine = h.engine();

    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoReply);
    let status = engine.status_handle().read().await.clone();
    assert_eq!(status.pending[0].unfilled_users, vec!["B"]);
    // Local state exists, so no availability probe.
    assert_eq!(h.portal.sessions_opened().await, 0);
    assert!(status.last_sync.is_none());
}

#[tokio::test]
async fn test_ignored_offering_returns_after_expiry() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "A");
    h.ignore.ignore("1", chrono::Duration::hours(24));
    let mut engine = h.engine();

    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NothingUnfilled);
    assert!(h.notifier.sent_messages().await.is_empty());

    // Re-ignore with a window that has already passed.
    h.ignore
        .ignore_at("1", chrono::Duration::hours(24), Utc::now() - chrono::Duration::hours(25));

    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NoReply);
    assert!(!h.ignore.contains("1"));
    let status = engine.status_handle().read().await.clone();
    assert_eq!(status.pending[0].unfilled_users, vec!["B"]);
}

#[tokio::test]
async fn test_ignore_reply_defers_offering() {
    let h = TestHarness::new().await;
    h.notifier.push_reply("ignore 1").await;
    let mut engine = h.engine();

    let before = Utc::now();
    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::Ignored {
            offering_id: "1".to_string()
        }
    );
    let record = h.ignore.snapshot().get("1").cloned().expect("ignore record");
    assert!(record.until >= before + chrono::Duration::hours(24));
    assert!(record.until <= Utc::now() + chrono::Duration::hours(24));

    let sent = h.notifier.sent_messages().await;
    assert_eq!(
        sent.last().unwrap(),
        "IPO Alpha Corp (ID: 1) will be ignored for 24 hours."
    );
    assert!(h.portal.applications().await.is_empty());

    // The next cycle sees nothing to do.
    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NothingUnfilled);
}

#[tokio::test]
async fn test_unmatched_reply_changes_nothing() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "A");
    h.notifier.push_reply("Zeta").await;
    let mut engine = h.engine();
    let status_before = h.status.snapshot();

    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::NoMatch {
            reply: "zeta".to_string()
        }
    );
    assert_eq!(h.status.snapshot(), status_before);
    assert!(h.ignore.snapshot().is_empty());
    let sent = h.notifier.sent_messages().await;
    assert_eq!(
        sent.last().unwrap(),
        "No matching IPO found for 'zeta'. Please try again."
    );

    // The consumed reply is not delivered again.
    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NoReply);
}

#[tokio::test]
async fn test_selection_applies_for_every_unfilled_user() {
    let h = TestHarness::new().await;
    h.notifier.push_reply("alpha").await;
    let mut engine = h.engine();

    let report = applied_report(engine.run_cycle().await.unwrap());

    assert_eq!(report.applied(), vec!["A", "B"]);
    assert!(!report.has_failures());
    assert!(h.status.is_filled("1", "A"));
    assert!(h.status.is_filled("1", "B"));

    let applications = h.portal.applications().await;
    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].indices, vec![1]);
    assert_eq!(applications[0].label, "Alpha Corp");

    let sent = h.notifier.sent_messages().await;
    let summary = sent.last().unwrap();
    assert!(summary.starts_with("IPO Application Summary:"));
    assert!(summary.contains("Successfully applied: A, B"));
    h.assert_sessions_closed().await;

    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NothingUnfilled);
}

#[tokio::test]
async fn test_partial_failure_continues_batch() {
    let h = TestHarness::new().await;
    h.portal.fail_at("A", PortalStage::Navigate).await;
    h.notifier.push_reply("1").await;
    let mut engine = h.engine();

    let report = applied_report(engine.run_cycle().await.unwrap());

    assert_eq!(report.applied(), vec!["B"]);
    assert_eq!(report.failed().len(), 1);
    assert!(report.failed()[0].starts_with("A: "));
    assert!(!h.status.is_filled("1", "A"));
    assert!(h.status.is_filled("1", "B"));

    let sent = h.notifier.sent_messages().await;
    assert!(sent
        .iter()
        .any(|m| m.starts_with("Failed to apply for IPO Alpha Corp (ID: 1) for: A: ")));
    h.assert_sessions_closed().await;
}

#[tokio::test]
async fn test_login_budget_exhaustion_fails_user() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "B");
    h.portal.reject_logins("A", 100).await;
    h.notifier.push_reply("alpha").await;
    let mut engine = h.engine();

    let report = applied_report(engine.run_cycle().await.unwrap());

    assert_eq!(report.results.len(), 1);
    assert!(matches!(report.results[0].outcome, UserOutcome::Failed(_)));
    assert_eq!(h.portal.login_attempts("A").await, 3);
    assert!(!h.status.is_filled("1", "A"));
    h.assert_sessions_closed().await;
}

#[tokio::test]
async fn test_already_applied_row_is_not_committed() {
    let h = TestHarness::new().await;
    let mut applied_row = fixtures::open_issue(1, "Alpha Corp");
    applied_row.action = "Edit".to_string();
    h.portal.set_open_issues_for("B", vec![applied_row]).await;
    h.notifier.push_reply("alpha").await;
    let mut engine = h.engine();

    let report = applied_report(engine.run_cycle().await.unwrap());

    assert_eq!(report.applied(), vec!["A"]);
    assert_eq!(report.already_applied(), vec!["B"]);
    assert!(!h.status.is_filled("1", "B"));
    assert_eq!(h.portal.applications().await.len(), 1);
}

#[tokio::test]
async fn test_dry_run_never_submits() {
    let h = TestHarness::new().await;
    h.notifier.push_reply("alpha").await;
    let mut engine = h.engine_with(EngineConfig {
        dry_run: true,
        ..Default::default()
    });

    let report = applied_report(engine.run_cycle().await.unwrap());

    assert!(report.dry_run);
    assert_eq!(report.dry_run_aliases(), vec!["A", "B"]);
    assert!(h.portal.applications().await.is_empty());
    assert!(!h.status.is_filled("1", "A"));
    let sent = h.notifier.sent_messages().await;
    assert!(sent.last().unwrap().contains("Dry Run Mode: true"));
    h.assert_sessions_closed().await;
}

#[tokio::test]
async fn test_availability_sync_marks_vanished_offerings() {
    let h = TestHarness::new().await;
    let mut closed = fixtures::offering("2", "Beta Hydro");
    closed.status = "Closed".to_string();
    h.catalog
        .set_offerings(vec![fixtures::offering("1", "Alpha Corp"), closed])
        .await;
    h.status.mark_filled("2", "A");
    let mut engine = h.engine();

    engine.run_cycle().await.unwrap();

    // Beta Hydro no longer shows in anyone's open list.
    assert!(h.status.is_filled("2", "B"));
    assert!(!h.status.contains("1"));
    let status = engine.status_handle().read().await.clone();
    let sync = status.last_sync.expect("sync summary");
    assert_eq!(sync.probed, vec!["A", "B"]);
    assert_eq!(sync.marked, vec!["2"]);
}

#[tokio::test]
async fn test_no_eligible_offerings_sends_nothing() {
    let h = TestHarness::new().await;
    h.catalog
        .set_offerings(vec![fixtures::past_offering("1", "Alpha Corp")])
        .await;
    let mut engine = h.engine();

    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NoneEligible);
    h.catalog.set_offerings(Vec::new()).await;
    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NoOfferings);
    assert!(h.notifier.sent_messages().await.is_empty());
    assert_eq!(h.portal.sessions_opened().await, 0);
}

#[tokio::test]
async fn test_catalog_error_is_recorded_and_recovered() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "A");
    h.catalog.set_next_error(CatalogError::Timeout).await;
    let mut engine = h.engine();

    assert!(engine.run_cycle().await.is_err());
    let status = engine.status_handle().read().await.clone();
    assert_eq!(status.iteration, 1);
    assert!(status.last_error.is_some());

    assert_eq!(engine.run_cycle().await.unwrap(), CycleOutcome::NoReply);
    let status = engine.status_handle().read().await.clone();
    assert_eq!(status.iteration, 2);
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn test_run_loop_stops_on_shutdown() {
    let h = TestHarness::new().await;
    h.status.mark_filled("1", "A");
    h.status.mark_filled("1", "B");
    let engine = h.engine();
    let status = engine.status_handle();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(engine.run(shutdown_rx));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while status.read().await.iteration < 3 {
        assert!(tokio::time::Instant::now() < deadline, "engine did not cycle");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(status.read().await.running);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("engine did not stop")
        .unwrap();

    let status = status.read().await.clone();
    assert!(!status.running);
    assert_eq!(status.last_outcome, Some(CycleOutcome::NothingUnfilled));
}
