//! Application outcomes and the operator summary.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Outcome of one user's probe for the selected offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum UserOutcome {
    /// Submitted and accepted; the fill record was written.
    Applied,
    /// The portal no longer offers the apply affordance. Nothing written.
    AlreadyApplied,
    /// Dry run: probed but not submitted.
    DryRun,
    /// Probe or submission failed. Nothing written.
    Failed(String),
}

impl UserOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            UserOutcome::Applied => "applied",
            UserOutcome::AlreadyApplied => "already_applied",
            UserOutcome::DryRun => "dry_run",
            UserOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    pub alias: String,
    #[serde(flatten)]
    pub outcome: UserOutcome,
}

/// Per-user results of applying to one offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub offering_id: String,
    pub company_name: String,
    pub dry_run: bool,
    pub results: Vec<UserResult>,
}

impl ApplicationReport {
    fn aliases_where(&self, pred: impl Fn(&UserOutcome) -> bool) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.alias.clone())
            .collect()
    }

    pub fn applied(&self) -> Vec<String> {
        self.aliases_where(|o| *o == UserOutcome::Applied)
    }

    pub fn already_applied(&self) -> Vec<String> {
        self.aliases_where(|o| *o == UserOutcome::AlreadyApplied)
    }

    pub fn dry_run_aliases(&self) -> Vec<String> {
        self.aliases_where(|o| *o == UserOutcome::DryRun)
    }

    /// Failed users as `alias: reason`.
    pub fn failed(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                UserOutcome::Failed(reason) => Some(format!("{}: {}", r.alias, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(r.outcome, UserOutcome::Failed(_)))
    }

    /// Summary sent after every selection.
    pub fn summary(&self, at: DateTime<Tz>) -> String {
        let mut lines = vec![
            "IPO Application Summary:".to_string(),
            format!("Company Name: {}", self.company_name),
            format!("Date: {}", at.format("%Y-%m-%d")),
            format!("Time: {}", at.format("%H:%M")),
            String::new(),
            format!("Successfully applied: {}", list(&self.applied())),
            format!("Already applied: {}", list(&self.already_applied())),
            format!("Failed applications: {}", list(&self.failed())),
        ];
        if self.dry_run {
            lines.push(format!("Probed without applying: {}", list(&self.dry_run_aliases())));
        }
        lines.push(String::new());
        lines.push(format!("Dry Run Mode: {}", self.dry_run));
        lines.join("\n")
    }

    /// Failure notice, if any user failed.
    pub fn failure_notice(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }
        Some(format!(
            "Failed to apply for IPO {} (ID: {}) for: {}",
            self.company_name,
            self.offering_id,
            self.failed().join("; ")
        ))
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
