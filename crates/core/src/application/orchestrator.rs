//! Run one portal probe per user and commit successful applications.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::UserConfig;
use crate::metrics;
use crate::offering::{Offering, UnfilledOffering};
use crate::portal::{
    authenticate_with_retry, OpenIssue, PortalDriver, PortalError, PortalSession, ASBA_PATH,
};
use crate::store::StatusStore;
use crate::sync::StatusReconciler;

use super::{ApplicationReport, UserOutcome, UserResult};

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Portal share category to apply to, e.g. "Ordinary Shares".
    pub share_category: String,
    /// Login attempt budget per probe.
    pub login_attempts: u32,
    /// Probe and reconcile but never submit.
    pub dry_run: bool,
}

/// Result of a probe-only availability pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Aliases whose probe completed.
    pub probed: Vec<String>,
    /// Aliases whose probe failed, as `alias: reason`.
    pub failed: Vec<String>,
    /// Offering ids marked filled during the pass.
    pub marked: Vec<String>,
}

/// Whether a portal row name and a catalog name denote the same issuer.
///
/// Names are compared case-insensitively after trimming; either may carry a
/// suffix the other lacks ("Ltd.", "Limited").
pub fn names_match(portal_name: &str, catalog_name: &str) -> bool {
    let a = portal_name.trim().to_lowercase();
    let b = catalog_name.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a == b || a.contains(&b) || b.contains(&a))
}

/// Applies a selected offering for its outstanding users.
pub struct ApplicationOrchestrator {
    portal: Arc<dyn PortalDriver>,
    status: Arc<StatusStore>,
    reconciler: Arc<StatusReconciler>,
    settings: OrchestratorSettings,
}

impl ApplicationOrchestrator {
    pub fn new(
        portal: Arc<dyn PortalDriver>,
        status: Arc<StatusStore>,
        reconciler: Arc<StatusReconciler>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            portal,
            status,
            reconciler,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Apply `target` for each of its unfilled users, one session at a time.
    ///
    /// A failing user never stops the batch. `catalog` is the full fetched
    /// catalog, used to reconcile each user's status against the portal.
    pub async fn apply(
        &self,
        target: &UnfilledOffering,
        users: &[UserConfig],
        catalog: &[Offering],
    ) -> ApplicationReport {
        let mut results = Vec::new();

        for alias in &target.unfilled_users {
            let Some(user) = users.iter().find(|u| &u.alias == alias) else {
                warn!(%alias, "No configuration for user, skipping");
                results.push(UserResult {
                    alias: alias.clone(),
                    outcome: UserOutcome::Failed("user not configured".to_string()),
                });
                continue;
            };

            info!(alias = %user.alias, offering_id = %target.id(), "Processing application");
            let mut session = self.portal.new_session();
            let outcome = self
                .apply_in_session(session.as_mut(), target, user, catalog)
                .await;
            session.close().await;

            metrics::APPLICATIONS_TOTAL
                .with_label_values(&[outcome.label()])
                .inc();
            match &outcome {
                UserOutcome::Failed(reason) => {
                    warn!(alias = %user.alias, offering_id = %target.id(), reason, "Application failed")
                }
                other => {
                    info!(alias = %user.alias, offering_id = %target.id(), outcome = other.label(), "Application finished")
                }
            }
            results.push(UserResult {
                alias: user.alias.clone(),
                outcome,
            });
        }

        ApplicationReport {
            offering_id: target.id().to_string(),
            company_name: target.company_name().to_string(),
            dry_run: self.settings.dry_run,
            results,
        }
    }

    /// Probe every user without submitting and reconcile the status store
    /// against what each user still sees as open.
    pub async fn probe_availability(&self, users: &[UserConfig], catalog: &[Offering]) -> SyncReport {
        let mut report = SyncReport::default();

        for user in users {
            let mut session = self.portal.new_session();
            let prepared = self.prepare(session.as_mut(), user).await;
            let result = match prepared {
                Ok(()) => {
                    let names = open_names(session.open_offerings());
                    let marked = self.reconciler.sync_availability(
                        names.as_slice(),
                        catalog,
                        std::slice::from_ref(&user.alias),
                    );
                    Ok(marked)
                }
                Err(e) => Err(e),
            };
            session.close().await;

            match result {
                Ok(marked) => {
                    metrics::PROBES_TOTAL.with_label_values(&["sync", "ok"]).inc();
                    report.probed.push(user.alias.clone());
                    for id in marked {
                        if !report.marked.contains(&id) {
                            report.marked.push(id);
                        }
                    }
                }
                Err(e) => {
                    metrics::PROBES_TOTAL.with_label_values(&["sync", "failed"]).inc();
                    warn!(alias = %user.alias, "Availability probe failed: {}", e);
                    report.failed.push(format!("{}: {}", user.alias, e));
                }
            }
        }

        report
    }

    /// Start, log in, open the application area and list open issues.
    async fn prepare(
        &self,
        session: &mut dyn PortalSession,
        user: &UserConfig,
    ) -> Result<(), PortalError> {
        session.start().await?;
        authenticate_with_retry(session, user, self.settings.login_attempts).await?;
        session.navigate(ASBA_PATH).await?;
        session.enumerate_open_offerings().await?;
        Ok(())
    }

    async fn apply_in_session(
        &self,
        session: &mut dyn PortalSession,
        target: &UnfilledOffering,
        user: &UserConfig,
        catalog: &[Offering],
    ) -> UserOutcome {
        if let Err(e) = self.prepare(session, user).await {
            metrics::PROBES_TOTAL.with_label_values(&["apply", "failed"]).inc();
            return UserOutcome::Failed(e.to_string());
        }
        metrics::PROBES_TOTAL.with_label_values(&["apply", "ok"]).inc();

        let names = open_names(session.open_offerings());
        self.reconciler
            .sync_availability(names.as_slice(), catalog, std::slice::from_ref(&user.alias));

        let rows: Vec<&OpenIssue> = session
            .open_offerings()
            .iter()
            .filter(|issue| {
                issue
                    .share_type
                    .trim()
                    .eq_ignore_ascii_case(self.settings.share_category.trim())
                    && names_match(&issue.name, target.company_name())
            })
            .collect();

        if rows.is_empty() {
            return UserOutcome::Failed("No open issues found".to_string());
        }

        let indices: Vec<usize> = rows
            .iter()
            .filter(|issue| issue.can_apply())
            .map(|issue| issue.index)
            .collect();
        if indices.is_empty() {
            return UserOutcome::AlreadyApplied;
        }

        if self.settings.dry_run {
            info!(alias = %user.alias, ?indices, "Dry run, not submitting");
            return UserOutcome::DryRun;
        }

        match session.apply(user, &indices, target.company_name()).await {
            Ok(report) if !report.succeeded.is_empty() => {
                if !self.status.mark_filled(target.id(), &user.alias) {
                    warn!(alias = %user.alias, offering_id = %target.id(), "Applied but fill record was not saved");
                }
                UserOutcome::Applied
            }
            Ok(report) => UserOutcome::Failed(if report.failed.is_empty() {
                "Application failed".to_string()
            } else {
                format!("Application failed: {}", report.failed.join(", "))
            }),
            Err(e) => UserOutcome::Failed(e.to_string()),
        }
    }
}

fn open_names(issues: &[OpenIssue]) -> Vec<String> {
    issues.iter().map(|issue| issue.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match() {
        assert!(names_match("Alpha Corp", "alpha corp"));
        assert!(names_match("Alpha Corp Limited", "Alpha Corp"));
        assert!(names_match(" Alpha Corp ", "Alpha Corp Ltd."));
        assert!(!names_match("Beta Hydro", "Alpha Corp"));
        assert!(!names_match("", "Alpha Corp"));
    }
}
