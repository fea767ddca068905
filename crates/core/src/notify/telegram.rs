//! Telegram Bot API backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::TelegramConfig;

use super::{InboundMessage, NotifyError, Notifier, ReplyBatch, ReplyCursor, ReplySource};

/// Telegram client used both for announcements and for reading replies.
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| NotifyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if !status.is_success() || !body.ok {
            return Err(NotifyError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.description.unwrap_or_default()
            )));
        }
        debug!("Telegram message sent");
        Ok(())
    }
}

#[async_trait]
impl ReplySource for TelegramClient {
    async fn fetch_replies(&self, cursor: ReplyCursor) -> Result<ReplyBatch, NotifyError> {
        let mut request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("timeout", "0")]);
        if let Some(offset) = cursor.next_offset() {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !status.is_success() || !body.ok {
            return Err(NotifyError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.description.unwrap_or_default()
            )));
        }

        let batch = accept_updates(
            body.result.unwrap_or_default(),
            cursor,
            &self.config.chat_id,
            self.config.allowed_user_id.as_deref(),
        );
        if !batch.messages.is_empty() {
            info!(count = batch.messages.len(), "Received operator replies");
        }
        Ok(batch)
    }
}

/// Keep text messages from the configured chat (and user, when set) and
/// advance the cursor past every update seen.
fn accept_updates(
    updates: Vec<Update>,
    cursor: ReplyCursor,
    chat_id: &str,
    allowed_user_id: Option<&str>,
) -> ReplyBatch {
    let mut batch = ReplyBatch {
        messages: Vec::new(),
        cursor,
    };

    for update in updates {
        if !cursor.admits(update.update_id) {
            continue;
        }
        if batch.cursor.admits(update.update_id) {
            batch.cursor = ReplyCursor::after(update.update_id);
        }

        let Some(message) = update.message else {
            continue;
        };
        let from_chat = message.chat.id.to_string();
        let sender = message.from.map(|u| u.id.to_string());
        let Some(text) = message.text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        if from_chat != chat_id {
            continue;
        }
        if let Some(allowed) = allowed_user_id {
            if sender.as_deref() != Some(allowed) {
                continue;
            }
        }

        batch.messages.push(InboundMessage {
            id: update.update_id,
            chat_id: from_chat,
            sender_id: sender,
            text,
        });
    }

    batch
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}
