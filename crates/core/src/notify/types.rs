//! Types for the operator channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the operator channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout
        } else if e.is_connect() {
            NotifyError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            NotifyError::InvalidResponse(e.to_string())
        } else {
            NotifyError::ApiError(e.to_string())
        }
    }
}

/// Position in the inbound message stream.
///
/// Holds the id of the last update already consumed; the next fetch only
/// returns updates with a greater id. `None` means nothing has been seen yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyCursor(pub Option<i64>);

impl ReplyCursor {
    /// Cursor positioned after update `id`.
    pub fn after(id: i64) -> Self {
        Self(Some(id))
    }

    /// First update id a fetch should return.
    pub fn next_offset(&self) -> Option<i64> {
        self.0.map(|id| id + 1)
    }

    /// Whether update `id` lies past this cursor.
    pub fn admits(&self, id: i64) -> bool {
        self.0.map_or(true, |last| id > last)
    }
}

/// An accepted message from the operator chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Update id, strictly increasing.
    pub id: i64,
    pub chat_id: String,
    pub sender_id: Option<String>,
    pub text: String,
}

/// Result of one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyBatch {
    /// Accepted messages in arrival order.
    pub messages: Vec<InboundMessage>,
    /// Cursor past every update the fetch saw, accepted or not.
    pub cursor: ReplyCursor,
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Deliver `text` to the operator. Never retried by callers.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Inbound reply channel.
#[async_trait]
pub trait ReplySource: Send + Sync {
    /// Fetch accepted messages past `cursor`.
    async fn fetch_replies(&self, cursor: ReplyCursor) -> Result<ReplyBatch, NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_offsets() {
        assert_eq!(ReplyCursor::default().next_offset(), None);
        assert_eq!(ReplyCursor::after(41).next_offset(), Some(42));
    }

    #[test]
    fn test_cursor_admits() {
        assert!(ReplyCursor::default().admits(1));
        assert!(ReplyCursor::after(5).admits(6));
        assert!(!ReplyCursor::after(5).admits(5));
        assert!(!ReplyCursor::after(5).admits(2));
    }
}
