//! One announce / wait / dispatch round with the operator.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::metrics;
use crate::notify::{send_logged, Notifier, ReplyCursor, ReplySource};
use crate::offering::UnfilledOffering;
use crate::store::IgnoreStore;

use super::{announcement, await_reply, find_match, ignore_confirmation, no_match, parse_reply};
use super::{ReplyCommand, WaitOutcome};

/// Timing and deferral settings for approval rounds.
#[derive(Debug, Clone)]
pub struct ApprovalSettings {
    pub reply_timeout: Duration,
    pub poll_interval: Duration,
    pub ignore_hours: u32,
}

/// What the operator decided in one round.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No reply within the wait window.
    NoReply,
    /// The offering was deferred. `until` is `None` if the record could not
    /// be written.
    Ignored {
        offering_id: String,
        until: Option<DateTime<Utc>>,
    },
    /// Apply to this offering for its unfilled users.
    Selected(UnfilledOffering),
    /// The reply matched nothing.
    NoMatch { reply: String },
}

/// Drives the approval protocol. Owns the reply cursor across rounds.
pub struct ApprovalDriver {
    notifier: Arc<dyn Notifier>,
    replies: Arc<dyn ReplySource>,
    ignore: Arc<IgnoreStore>,
    settings: ApprovalSettings,
    cursor: ReplyCursor,
}

impl ApprovalDriver {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        replies: Arc<dyn ReplySource>,
        ignore: Arc<IgnoreStore>,
        settings: ApprovalSettings,
    ) -> Self {
        Self {
            notifier,
            replies,
            ignore,
            settings,
            cursor: ReplyCursor::default(),
        }
    }

    pub fn cursor(&self) -> ReplyCursor {
        self.cursor
    }

    /// Announce `unfilled`, wait for a reply and dispatch it.
    ///
    /// Ignore and no-match replies are fully handled here; a selection is
    /// returned for the caller to act on.
    pub async fn run_round(&mut self, unfilled: &[UnfilledOffering]) -> Decision {
        send_logged(
            self.notifier.as_ref(),
            &announcement(unfilled, self.settings.ignore_hours),
        )
        .await;

        info!(offerings = unfilled.len(), "Waiting for operator reply");
        let outcome = await_reply(
            self.replies.as_ref(),
            &mut self.cursor,
            self.settings.reply_timeout,
            self.settings.poll_interval,
        )
        .await;

        let message = match outcome {
            WaitOutcome::Reply(message) => message,
            WaitOutcome::NoReply => {
                info!("No operator reply, skipping this round");
                metrics::APPROVAL_REPLIES.with_label_values(&["timeout"]).inc();
                return Decision::NoReply;
            }
        };

        self.dispatch(unfilled, &message.text).await
    }

    async fn dispatch(&self, unfilled: &[UnfilledOffering], text: &str) -> Decision {
        let Some(command) = parse_reply(text) else {
            return self.report_no_match(text.trim()).await;
        };

        match (&command, find_match(unfilled, command.token())) {
            (ReplyCommand::Ignore(_), Some(target)) => {
                let duration = chrono::Duration::hours(i64::from(self.settings.ignore_hours));
                let until = self.ignore.ignore(target.id(), duration);
                metrics::APPROVAL_REPLIES.with_label_values(&["ignore"]).inc();
                send_logged(
                    self.notifier.as_ref(),
                    &ignore_confirmation(target, self.settings.ignore_hours),
                )
                .await;
                Decision::Ignored {
                    offering_id: target.id().to_string(),
                    until,
                }
            }
            (ReplyCommand::Select(_), Some(target)) => {
                info!(offering_id = %target.id(), company = %target.company_name(), "Operator selected offering");
                metrics::APPROVAL_REPLIES.with_label_values(&["select"]).inc();
                Decision::Selected(target.clone())
            }
            (_, None) => self.report_no_match(command.token()).await,
        }
    }

    async fn report_no_match(&self, reply: &str) -> Decision {
        warn!(reply, "No matching offering for reply");
        metrics::APPROVAL_REPLIES.with_label_values(&["no_match"]).inc();
        send_logged(self.notifier.as_ref(), &no_match(reply)).await;
        Decision::NoMatch {
            reply: reply.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockNotifier};
    use tempfile::TempDir;

    fn settings() -> ApprovalSettings {
        ApprovalSettings {
            reply_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
            ignore_hours: 24,
        }
    }

    fn setup() -> (TempDir, Arc<MockNotifier>, Arc<IgnoreStore>, ApprovalDriver) {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(MockNotifier::new());
        let ignore = Arc::new(IgnoreStore::open(dir.path().join("ignore.json")));
        let driver = ApprovalDriver::new(notifier.clone(), notifier.clone(), ignore.clone(), settings());
        (dir, notifier, ignore, driver)
    }

    #[tokio::test]
    async fn test_announces_then_times_out() {
        let (_dir, notifier, ignore, mut driver) = setup();
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A", "B"])];

        let decision = driver.run_round(&unfilled).await;

        assert_eq!(decision, Decision::NoReply);
        let sent = notifier.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Alpha Corp (ID: 1)"));
        assert!(ignore.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_ignore_writes_record_and_confirms() {
        let (_dir, notifier, ignore, mut driver) = setup();
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A"])];
        notifier.push_reply("ignore 1").await;

        let before = Utc::now();
        let decision = driver.run_round(&unfilled).await;

        let Decision::Ignored { offering_id, until } = decision else {
            panic!("expected an ignore decision");
        };
        assert_eq!(offering_id, "1");
        let until = until.unwrap();
        assert!(until >= before + chrono::Duration::hours(24));
        assert!(until <= Utc::now() + chrono::Duration::hours(24));
        assert!(ignore.is_ignored("1", Utc::now()));

        let sent = notifier.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "IPO Alpha Corp (ID: 1) will be ignored for 24 hours.");
    }

    #[tokio::test]
    async fn test_selection_by_name() {
        let (_dir, notifier, ignore, mut driver) = setup();
        let unfilled = vec![
            fixtures::unfilled("1", "Alpha Corp", &["A"]),
            fixtures::unfilled("2", "Beta Hydro", &["A", "B"]),
        ];
        notifier.push_reply("  BETA ").await;

        let decision = driver.run_round(&unfilled).await;

        assert_eq!(decision, Decision::Selected(unfilled[1].clone()));
        assert_eq!(notifier.sent_messages().await.len(), 1);
        assert!(ignore.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_reply_reports_no_match() {
        let (_dir, notifier, ignore, mut driver) = setup();
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A"])];
        notifier.push_reply("Zeta").await;

        let decision = driver.run_round(&unfilled).await;

        assert_eq!(decision, Decision::NoMatch { reply: "zeta".to_string() });
        let sent = notifier.sent_messages().await;
        assert_eq!(sent[1], "No matching IPO found for 'zeta'. Please try again.");
        assert!(ignore.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_ignore_writes_nothing() {
        let (_dir, notifier, ignore, mut driver) = setup();
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A"])];
        notifier.push_reply("skip zeta").await;

        let decision = driver.run_round(&unfilled).await;

        assert!(matches!(decision, Decision::NoMatch { .. }));
        assert!(ignore.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_persists_across_rounds() {
        let (_dir, notifier, _ignore, mut driver) = setup();
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A"])];
        notifier.push_reply("alpha").await;

        assert!(matches!(driver.run_round(&unfilled).await, Decision::Selected(_)));
        assert_ne!(driver.cursor(), ReplyCursor::default());
        assert_eq!(driver.run_round(&unfilled).await, Decision::NoReply);
    }

    #[tokio::test]
    async fn test_failed_announcement_still_waits() {
        let (_dir, notifier, _ignore, mut driver) = setup();
        notifier.set_send_failure(true).await;
        notifier.push_reply("1").await;
        let unfilled = vec![fixtures::unfilled("1", "Alpha Corp", &["A"])];

        assert!(matches!(driver.run_round(&unfilled).await, Decision::Selected(_)));
        assert!(notifier.sent_messages().await.is_empty());
    }
}
