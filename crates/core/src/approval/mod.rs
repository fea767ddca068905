//! Human-in-the-loop approval.
//!
//! Each round announces the unfilled offerings, waits a bounded time for a
//! reply from the operator chat and turns the reply into a [`Decision`]:
//! `ignore <token>` / `skip <token>` defers the first matching offering,
//! any other text selects the first offering whose id or name contains it.

mod command;
mod driver;
mod message;
mod wait;

pub use command::{find_match, parse_reply, ReplyCommand};
pub use driver::{ApprovalDriver, ApprovalSettings, Decision};
pub use message::{announcement, ignore_confirmation, no_match};
pub use wait::{await_reply, WaitOutcome};
