//! Operator channel: announcements out, replies in.

mod telegram;
mod types;

pub use telegram::TelegramClient;
pub use types::*;

use tracing::warn;

use crate::metrics;

/// Send without propagating failures. Returns whether delivery succeeded.
pub async fn send_logged(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.send(text).await {
        Ok(()) => {
            metrics::NOTIFICATIONS.with_label_values(&["sent"]).inc();
            true
        }
        Err(e) => {
            warn!(backend = notifier.name(), "Failed to send notification: {}", e);
            metrics::NOTIFICATIONS.with_label_values(&["failed"]).inc();
            false
        }
    }
}
