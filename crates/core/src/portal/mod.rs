//! Portal automation.
//!
//! A [`PortalSession`] is one end-to-end session for a single user: start,
//! log in, open the application area, list the applicable issues and
//! optionally submit applications. [`PortalDriver`] creates sessions so the
//! engine can run one probe per user. Every error a session returns is a
//! probe failure for that user and never stops the engine.

mod login;
mod rest;
mod types;

pub use login::authenticate_with_retry;
pub use rest::{normalize_username, RestPortal, RestSession, APPLIED_MESSAGE};
pub use types::*;
