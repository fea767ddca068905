//! Persisted engine state.
//!
//! Two independent JSON documents are the only durable state:
//! - the status document, `{offering_id: {alias: true}}`
//! - the ignore document, `{offering_id: {"until": <RFC 3339>}}`
//!
//! Each document has its own lock scoped to the whole read-modify-write.
//! Store failures never propagate to the engine: they are logged, counted,
//! and the caller continues with the best state available.

mod document;
mod ignore;
mod status;

pub use document::JsonDocument;
pub use ignore::{IgnoreDocument, IgnoreRecord, IgnoreStore, DEFAULT_IGNORE_HOURS};
pub use status::{StatusDocument, StatusStore};

use thiserror::Error;

/// Errors from reading or writing a state document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },
}
