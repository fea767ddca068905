//! Mock portal driver for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::UserConfig;
use crate::portal::{ApplyReport, OpenIssue, PortalDriver, PortalError, PortalSession, ASBA_PATH};

/// Session stage a scripted failure is injected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalStage {
    Start,
    Authenticate,
    Navigate,
    Enumerate,
    Apply,
}

/// A recorded apply call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedApplication {
    pub alias: String,
    pub indices: Vec<usize>,
    pub label: String,
}

#[derive(Debug, Default)]
struct MockPortalState {
    /// Open issues listed for every user without a per-user list.
    default_issues: Vec<OpenIssue>,
    issues_by_alias: HashMap<String, Vec<OpenIssue>>,
    /// Issue names each alias has applied to; listed as "Edit" afterwards.
    applied: HashSet<(String, String)>,
    failures: HashMap<String, PortalStage>,
    rejected_logins: HashMap<String, u32>,
    rejected_applications: HashSet<String>,
    login_attempts: HashMap<String, u32>,
    applications: Vec<RecordedApplication>,
    sessions_opened: u32,
    sessions_closed: u32,
}

/// Mock implementation of the PortalDriver trait.
///
/// Each session reads a shared script: which issues a user sees, at which
/// stage a user's session fails, how many logins are rejected first, and
/// whether submissions are refused. Successful submissions flip the row's
/// action from "Apply" to "Edit" for that user, like the real portal.
///
/// # Example
///
/// ```rust,ignore
/// let portal = MockPortal::new();
/// portal.set_open_issues(vec![fixtures::open_issue(1, "Alpha Corp")]).await;
/// portal.fail_at("B", PortalStage::Navigate).await;
/// // ... run the orchestrator ...
/// assert_eq!(portal.sessions_opened().await, portal.sessions_closed().await);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockPortal {
    state: Arc<RwLock<MockPortalState>>,
}

impl MockPortal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues listed for every user.
    pub async fn set_open_issues(&self, issues: Vec<OpenIssue>) {
        self.state.write().await.default_issues = issues;
    }

    /// Issues listed for one user, overriding the shared list.
    pub async fn set_open_issues_for(&self, alias: &str, issues: Vec<OpenIssue>) {
        self.state
            .write()
            .await
            .issues_by_alias
            .insert(alias.to_string(), issues);
    }

    /// Fail every session of `alias` at `stage`.
    pub async fn fail_at(&self, alias: &str, stage: PortalStage) {
        self.state
            .write()
            .await
            .failures
            .insert(alias.to_string(), stage);
    }

    /// Reject the first `count` login attempts of `alias`.
    pub async fn reject_logins(&self, alias: &str, count: u32) {
        self.state
            .write()
            .await
            .rejected_logins
            .insert(alias.to_string(), count);
    }

    /// Refuse every submission by `alias`.
    pub async fn reject_applications(&self, alias: &str) {
        self.state
            .write()
            .await
            .rejected_applications
            .insert(alias.to_string());
    }

    pub async fn login_attempts(&self, alias: &str) -> u32 {
        self.state
            .read()
            .await
            .login_attempts
            .get(alias)
            .copied()
            .unwrap_or(0)
    }

    pub async fn applications(&self) -> Vec<RecordedApplication> {
        self.state.read().await.applications.clone()
    }

    pub async fn sessions_opened(&self) -> u32 {
        self.state.read().await.sessions_opened
    }

    pub async fn sessions_closed(&self) -> u32 {
        self.state.read().await.sessions_closed
    }
}

impl PortalDriver for MockPortal {
    fn name(&self) -> &str {
        "mock"
    }

    fn new_session(&self) -> Box<dyn PortalSession> {
        Box::new(MockPortalSession {
            state: Arc::clone(&self.state),
            started: false,
            alias: None,
            navigated: false,
            issues: Vec::new(),
        })
    }
}

struct MockPortalSession {
    state: Arc<RwLock<MockPortalState>>,
    started: bool,
    alias: Option<String>,
    navigated: bool,
    issues: Vec<OpenIssue>,
}

impl MockPortalSession {
    async fn scripted_failure(&self, alias: &str, stage: PortalStage) -> Result<(), PortalError> {
        if self.state.read().await.failures.get(alias) == Some(&stage) {
            return Err(PortalError::ApiError(format!("mock failure at {:?}", stage)));
        }
        Ok(())
    }
}

#[async_trait]
impl PortalSession for MockPortalSession {
    async fn start(&mut self) -> Result<(), PortalError> {
        self.state.write().await.sessions_opened += 1;
        self.started = true;
        Ok(())
    }

    async fn authenticate(&mut self, user: &UserConfig) -> Result<(), PortalError> {
        if !self.started {
            return Err(PortalError::NotStarted);
        }
        // Start failures are attributed once the user is known.
        self.scripted_failure(&user.alias, PortalStage::Start).await?;

        {
            let mut state = self.state.write().await;
            *state.login_attempts.entry(user.alias.clone()).or_insert(0) += 1;
            if let Some(remaining) = state.rejected_logins.get_mut(&user.alias) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(PortalError::LoginRejected("invalid credentials".to_string()));
                }
            }
        }

        self.scripted_failure(&user.alias, PortalStage::Authenticate).await?;
        self.alias = Some(user.alias.clone());
        Ok(())
    }

    async fn navigate(&mut self, path: &str) -> Result<(), PortalError> {
        let alias = self.alias.clone().ok_or(PortalError::NotAuthenticated)?;
        self.scripted_failure(&alias, PortalStage::Navigate).await?;
        if path != ASBA_PATH {
            return Err(PortalError::NavigationFailed(format!("unknown path {}", path)));
        }
        self.navigated = true;
        Ok(())
    }

    async fn enumerate_open_offerings(&mut self) -> Result<(), PortalError> {
        let alias = self.alias.clone().ok_or(PortalError::NotAuthenticated)?;
        if !self.navigated {
            return Err(PortalError::NavigationFailed("not navigated".to_string()));
        }
        self.scripted_failure(&alias, PortalStage::Enumerate).await?;

        let state = self.state.read().await;
        let listed = state
            .issues_by_alias
            .get(&alias)
            .unwrap_or(&state.default_issues);
        self.issues = listed
            .iter()
            .map(|issue| {
                let mut issue = issue.clone();
                if state.applied.contains(&(alias.clone(), issue.name.clone())) {
                    issue.action = "Edit".to_string();
                }
                issue
            })
            .collect();
        Ok(())
    }

    fn open_offerings(&self) -> &[OpenIssue] {
        &self.issues
    }

    async fn apply(
        &mut self,
        user: &UserConfig,
        indices: &[usize],
        label: &str,
    ) -> Result<ApplyReport, PortalError> {
        self.scripted_failure(&user.alias, PortalStage::Apply).await?;

        let mut state = self.state.write().await;
        state.applications.push(RecordedApplication {
            alias: user.alias.clone(),
            indices: indices.to_vec(),
            label: label.to_string(),
        });

        let mut report = ApplyReport::default();
        for &index in indices {
            let issue = index
                .checked_sub(1)
                .and_then(|i| self.issues.get(i))
                .ok_or(PortalError::InvalidIndex(index))?;
            if state.rejected_applications.contains(&user.alias) {
                report.failed.push(format!("{}: rejected", issue.ticker));
            } else {
                state
                    .applied
                    .insert((user.alias.clone(), issue.name.clone()));
                report.succeeded.push(issue.ticker.clone());
            }
        }
        Ok(report)
    }

    async fn close(&mut self) {
        self.state.write().await.sessions_closed += 1;
        self.started = false;
        self.alias = None;
        self.issues.clear();
    }
}
