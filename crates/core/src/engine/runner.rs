//! The poll / decide / act / wait loop.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

use crate::application::{ApplicationOrchestrator, OrchestratorSettings};
use crate::approval::{ApprovalDriver, ApprovalSettings, Decision};
use crate::catalog::OfferingCatalog;
use crate::config::{Config, UserConfig};
use crate::metrics;
use crate::notify::{send_logged, Notifier, ReplySource};
use crate::offering::{EligibilityFilter, UnfilledOffering};
use crate::portal::PortalDriver;
use crate::store::{IgnoreStore, StatusStore};
use crate::sync::{StatusReconciler, UnfilledResolver};

use super::{CycleOutcome, EngineConfig, EngineError, EngineStatus, EngineTiming, SyncSummary};

/// Everything the engine needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub engine: EngineConfig,
    pub timing: EngineTiming,
    pub users: Vec<UserConfig>,
    pub login_attempts: u32,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            engine: config.engine.clone(),
            timing: config.engine.timing(),
            users: config.users.clone(),
            login_attempts: config.portal.login_attempts,
        }
    }
}

/// External collaborators and shared stores.
#[derive(Clone)]
pub struct EngineContext {
    pub catalog: Arc<dyn OfferingCatalog>,
    pub portal: Arc<dyn PortalDriver>,
    pub notifier: Arc<dyn Notifier>,
    pub replies: Arc<dyn ReplySource>,
    pub status_store: Arc<StatusStore>,
    pub ignore_store: Arc<IgnoreStore>,
}

/// Runs cycles sequentially until shut down.
pub struct IpoEngine {
    settings: EngineSettings,
    aliases: Vec<String>,
    catalog: Arc<dyn OfferingCatalog>,
    notifier: Arc<dyn Notifier>,
    ignore_store: Arc<IgnoreStore>,
    filter: EligibilityFilter,
    reconciler: Arc<StatusReconciler>,
    resolver: UnfilledResolver,
    approval: ApprovalDriver,
    orchestrator: ApplicationOrchestrator,
    status: Arc<RwLock<EngineStatus>>,
}

impl IpoEngine {
    pub fn new(settings: EngineSettings, ctx: EngineContext) -> Result<Self, EngineError> {
        let zone = settings.engine.zone()?;
        let reconciler = Arc::new(StatusReconciler::new(
            ctx.status_store.clone(),
            ctx.ignore_store.clone(),
        ));
        let resolver = UnfilledResolver::new(ctx.status_store.clone(), ctx.ignore_store.clone());
        let approval = ApprovalDriver::new(
            ctx.notifier.clone(),
            ctx.replies.clone(),
            ctx.ignore_store.clone(),
            ApprovalSettings {
                reply_timeout: settings.timing.reply_timeout,
                poll_interval: settings.timing.reply_poll_interval,
                ignore_hours: settings.engine.ignore_hours,
            },
        );
        let orchestrator = ApplicationOrchestrator::new(
            ctx.portal.clone(),
            ctx.status_store.clone(),
            reconciler.clone(),
            OrchestratorSettings {
                share_category: settings.engine.share_category.clone(),
                login_attempts: settings.login_attempts,
                dry_run: settings.engine.dry_run,
            },
        );
        let status = EngineStatus {
            dry_run: settings.engine.dry_run,
            ..Default::default()
        };

        Ok(Self {
            aliases: settings.users.iter().map(|u| u.alias.clone()).collect(),
            settings,
            catalog: ctx.catalog,
            notifier: ctx.notifier,
            ignore_store: ctx.ignore_store,
            filter: EligibilityFilter::new(zone),
            reconciler,
            resolver,
            approval,
            orchestrator,
            status: Arc::new(RwLock::new(status)),
        })
    }

    /// Shared handle to the live status snapshot.
    pub fn status_handle(&self) -> Arc<RwLock<EngineStatus>> {
        Arc::clone(&self.status)
    }

    /// Run until `shutdown` fires. A cycle in flight always completes.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            users = self.aliases.len(),
            dry_run = self.settings.engine.dry_run,
            "Engine started"
        );
        self.status.write().await.running = true;

        loop {
            let delay = match self.run_cycle().await {
                Ok(_) => self.settings.timing.check_interval,
                Err(_) => self.settings.timing.error_backoff,
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Engine received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.status.write().await.running = false;
        info!("Engine stopped");
    }

    /// Run one cycle, recording metrics and status.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, EngineError> {
        let started = Instant::now();
        let iteration = {
            let mut status = self.status.write().await;
            status.iteration += 1;
            status.last_cycle_started_at = Some(Utc::now());
            status.iteration
        };
        info!(iteration, "Starting cycle");

        let result = self.cycle().await;

        metrics::CYCLE_DURATION
            .with_label_values(&[])
            .observe(started.elapsed().as_secs_f64());
        let mut status = self.status.write().await;
        status.last_cycle_finished_at = Some(Utc::now());
        status.awaiting_reply = false;
        match &result {
            Ok(outcome) => {
                metrics::CYCLES_TOTAL.with_label_values(&[outcome.label()]).inc();
                info!(iteration, outcome = outcome.label(), "Cycle finished");
                status.last_outcome = Some(outcome.clone());
                status.last_error = None;
            }
            Err(e) => {
                metrics::CYCLES_TOTAL.with_label_values(&["error"]).inc();
                error!(iteration, "Cycle failed: {}", e);
                status.last_error = Some(e.to_string());
            }
        }

        result
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, EngineError> {
        let swept = self.ignore_store.sweep_expired(Utc::now());
        if swept > 0 {
            info!(swept, "Removed expired ignore records");
        }

        let catalog = self.catalog.fetch().await?;
        if catalog.is_empty() {
            warn!(catalog = self.catalog.name(), "Catalog returned no offerings");
            self.set_pending(Vec::new()).await;
            return Ok(CycleOutcome::NoOfferings);
        }
        info!(count = catalog.len(), "Fetched offerings");

        let eligible = self.filter.filter_on(&catalog, self.filter.today());
        if eligible.is_empty() {
            self.set_pending(Vec::new()).await;
            return Ok(CycleOutcome::NoneEligible);
        }

        if self.reconciler.needs_status_sync(&eligible) {
            info!("No local state for eligible offerings, probing availability");
            let report = self
                .orchestrator
                .probe_availability(&self.settings.users, &catalog)
                .await;
            info!(
                probed = report.probed.len(),
                failed = report.failed.len(),
                marked = report.marked.len(),
                "Availability sync finished"
            );
            self.status.write().await.last_sync = Some(SyncSummary::new(report, Utc::now()));
        }

        let unfilled = self
            .resolver
            .resolve_unfilled(&eligible, &self.aliases, Utc::now());
        self.set_pending(unfilled.clone()).await;
        if unfilled.is_empty() {
            info!("No unfilled offerings for any user");
            return Ok(CycleOutcome::NothingUnfilled);
        }

        self.status.write().await.awaiting_reply = true;
        let decision = self.approval.run_round(&unfilled).await;
        self.status.write().await.awaiting_reply = false;

        let outcome = match decision {
            Decision::NoReply => CycleOutcome::NoReply,
            Decision::Ignored { offering_id, .. } => CycleOutcome::Ignored { offering_id },
            Decision::NoMatch { reply } => CycleOutcome::NoMatch { reply },
            Decision::Selected(target) => {
                let report = self
                    .orchestrator
                    .apply(&target, &self.settings.users, &catalog)
                    .await;
                if let Some(notice) = report.failure_notice() {
                    send_logged(self.notifier.as_ref(), &notice).await;
                }
                let local_now = Utc::now().with_timezone(&self.filter.zone());
                send_logged(self.notifier.as_ref(), &report.summary(local_now)).await;
                CycleOutcome::Applied { report }
            }
        };

        Ok(outcome)
    }

    async fn set_pending(&self, pending: Vec<UnfilledOffering>) {
        self.status.write().await.pending = pending;
    }
}
