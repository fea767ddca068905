//! Types for portal automation sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UserConfig;

/// Navigation target holding the list of applicable issues.
pub const ASBA_PATH: &str = "asba";

/// Affordance label of a row that can still be applied to.
pub const APPLY_ACTION: &str = "Apply";

/// Errors that can occur during a portal session.
///
/// Every variant is a probe failure for the affected user, never a process
/// failure.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Session not started")]
    NotStarted,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Open issues unavailable: {0}")]
    IssuesUnavailable(String),

    #[error("Invalid issue index: {0}")]
    InvalidIndex(usize),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Whether another login attempt may succeed.
    pub fn is_retryable_login(&self) -> bool {
        matches!(
            self,
            PortalError::LoginRejected(_) | PortalError::Timeout | PortalError::ConnectionFailed(_)
        )
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PortalError::Timeout
        } else if e.is_connect() {
            PortalError::ConnectionFailed(e.to_string())
        } else {
            PortalError::ApiError(e.to_string())
        }
    }
}

/// One row of the portal's applicable-issue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenIssue {
    /// 1-based position in the list, used to address the row in `apply`.
    pub index: usize,
    /// Issue name as shown by the portal (matches the catalog company name).
    pub name: String,
    /// Issued for, e.g. "General Public".
    pub issued_for: String,
    pub ticker: String,
    /// Type of issue, e.g. "IPO".
    pub issue_type: String,
    /// Type of share, e.g. "Ordinary Shares".
    pub share_type: String,
    /// Affordance offered for the row: [`APPLY_ACTION`] or something else
    /// ("Edit", "In Process") once an application exists.
    pub action: String,
}

impl OpenIssue {
    /// Whether the row still offers the apply affordance.
    pub fn can_apply(&self) -> bool {
        self.action.trim().eq_ignore_ascii_case(APPLY_ACTION)
    }
}

/// Result of submitting applications for a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Tickers applied successfully.
    pub succeeded: Vec<String>,
    /// Tickers whose submission failed, with the portal message.
    pub failed: Vec<String>,
}

/// A single end-to-end session with the portal for one user.
///
/// The session owns driver resources; callers must call [`close`](Self::close)
/// on every exit path.
#[async_trait]
pub trait PortalSession: Send {
    /// Acquire driver resources.
    async fn start(&mut self) -> Result<(), PortalError>;

    /// Log in as `user`. A single attempt; see [`super::authenticate_with_retry`].
    async fn authenticate(&mut self, user: &UserConfig) -> Result<(), PortalError>;

    /// Move to a portal area, e.g. [`ASBA_PATH`].
    async fn navigate(&mut self, path: &str) -> Result<(), PortalError>;

    /// Load the applicable-issue list into the session.
    async fn enumerate_open_offerings(&mut self) -> Result<(), PortalError>;

    /// Rows loaded by the last [`enumerate_open_offerings`](Self::enumerate_open_offerings).
    fn open_offerings(&self) -> &[OpenIssue];

    /// Submit applications for the rows at `indices`. `label` names the
    /// target offering for logging.
    async fn apply(
        &mut self,
        user: &UserConfig,
        indices: &[usize],
        label: &str,
    ) -> Result<ApplyReport, PortalError>;

    /// Release driver resources. Never fails.
    async fn close(&mut self);
}

/// Factory for portal sessions.
pub trait PortalDriver: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Create a fresh, unstarted session.
    fn new_session(&self) -> Box<dyn PortalSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(action: &str) -> OpenIssue {
        OpenIssue {
            index: 1,
            name: "Alpha Corp".to_string(),
            issued_for: "General Public".to_string(),
            ticker: "ALPHA".to_string(),
            issue_type: "IPO".to_string(),
            share_type: "Ordinary Shares".to_string(),
            action: action.to_string(),
        }
    }

    #[test]
    fn test_can_apply() {
        assert!(issue("Apply").can_apply());
        assert!(issue(" apply ").can_apply());
        assert!(!issue("Edit").can_apply());
        assert!(!issue("In Process").can_apply());
    }

    #[test]
    fn test_retryable_login_errors() {
        assert!(PortalError::LoginRejected("bad".into()).is_retryable_login());
        assert!(PortalError::Timeout.is_retryable_login());
        assert!(!PortalError::NotStarted.is_retryable_login());
        assert!(!PortalError::ApiError("x".into()).is_retryable_login());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PortalError::InvalidIndex(4).to_string(),
            "Invalid issue index: 4"
        );
    }
}
