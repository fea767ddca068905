//! Bounded wait for an operator reply.

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::notify::{InboundMessage, ReplyCursor, ReplySource};

/// Result of waiting for a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Reply(InboundMessage),
    NoReply,
}

/// Poll `source` every `poll_interval` until a message arrives or `limit`
/// elapses.
///
/// On a reply the cursor moves to that message, so later messages of the same
/// batch stay pending. Otherwise it moves past every update seen. Fetch errors
/// are logged and polling continues.
pub async fn await_reply(
    source: &dyn ReplySource,
    cursor: &mut ReplyCursor,
    limit: Duration,
    poll_interval: Duration,
) -> WaitOutcome {
    let deadline = Instant::now() + limit;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match timeout(remaining, source.fetch_replies(*cursor)).await {
            Ok(Ok(batch)) => {
                if let Some(message) = batch.messages.into_iter().next() {
                    *cursor = ReplyCursor::after(message.id);
                    info!(update_id = message.id, "Operator replied");
                    return WaitOutcome::Reply(message);
                }
                *cursor = batch.cursor;
            }
            Ok(Err(e)) => warn!("Failed to fetch replies: {}", e),
            Err(_) => break,
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        sleep(poll_interval.min(remaining)).await;
    }

    debug!(?limit, "No reply within the wait window");
    WaitOutcome::NoReply
}
