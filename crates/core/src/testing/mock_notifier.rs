//! Mock operator channel for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notify::{InboundMessage, NotifyError, Notifier, ReplyBatch, ReplyCursor, ReplySource};

/// Chat id the mock attributes replies to.
pub const MOCK_CHAT_ID: &str = "1000";

#[derive(Debug, Default)]
struct MockNotifierState {
    sent: Vec<String>,
    replies: Vec<InboundMessage>,
    next_update_id: i64,
    send_failure: bool,
    fetch_failures: u32,
    fetches: u32,
}

/// Mock implementation of both Notifier and ReplySource.
///
/// Records delivered messages and serves queued replies honouring the cursor,
/// so a reply is only ever returned to a cursor that has not passed it.
///
/// # Example
///
/// ```rust,ignore
/// let notifier = MockNotifier::new();
/// notifier.push_reply("ignore 1").await;
/// // ... run an approval round ...
/// assert_eq!(notifier.sent_messages().await.len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockNotifier {
    state: Arc<RwLock<MockNotifierState>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply from the operator chat.
    pub async fn push_reply(&self, text: &str) -> i64 {
        let mut state = self.state.write().await;
        state.next_update_id += 1;
        let id = state.next_update_id;
        state.replies.push(InboundMessage {
            id,
            chat_id: MOCK_CHAT_ID.to_string(),
            sender_id: None,
            text: text.to_string(),
        });
        id
    }

    /// Messages delivered so far. Failed sends are not recorded.
    pub async fn sent_messages(&self) -> Vec<String> {
        self.state.read().await.sent.clone()
    }

    pub async fn clear_sent(&self) {
        self.state.write().await.sent.clear();
    }

    /// Make every send fail until reset.
    pub async fn set_send_failure(&self, fail: bool) {
        self.state.write().await.send_failure = fail;
    }

    /// Fail the next `count` fetches.
    pub async fn fail_next_fetches(&self, count: u32) {
        self.state.write().await.fetch_failures = count;
    }

    pub async fn fetch_count(&self) -> u32 {
        self.state.read().await.fetches
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        if state.send_failure {
            return Err(NotifyError::ConnectionFailed("mock send failure".to_string()));
        }
        state.sent.push(text.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReplySource for MockNotifier {
    async fn fetch_replies(&self, cursor: ReplyCursor) -> Result<ReplyBatch, NotifyError> {
        let mut state = self.state.write().await;
        state.fetches += 1;
        if state.fetch_failures > 0 {
            state.fetch_failures -= 1;
            return Err(NotifyError::Timeout);
        }

        let messages: Vec<InboundMessage> = state
            .replies
            .iter()
            .filter(|m| cursor.admits(m.id))
            .cloned()
            .collect();
        let cursor = messages
            .last()
            .map(|m| ReplyCursor::after(m.id))
            .unwrap_or(cursor);
        Ok(ReplyBatch { messages, cursor })
    }
}
