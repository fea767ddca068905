//! Fill status per (offering, user).

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{error, info};

use super::{JsonDocument, StoreError};
use crate::metrics;

/// `{offering_id: {alias: filled}}`
pub type StatusDocument = BTreeMap<String, BTreeMap<String, bool>>;

/// Durable record of which users have applied to which offerings.
///
/// Records are only ever set to `true`; nothing in this store resets one.
#[derive(Debug)]
pub struct StatusStore {
    doc: JsonDocument<StatusDocument>,
}

impl StatusStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new("status", path),
        }
    }

    /// Whether `alias` has a true record for `offering_id`. Absent or
    /// unreadable records count as not filled.
    pub fn is_filled(&self, offering_id: &str, alias: &str) -> bool {
        self.snapshot()
            .get(offering_id)
            .and_then(|users| users.get(alias))
            .copied()
            .unwrap_or(false)
    }

    /// Whether the store has any record for `offering_id`.
    pub fn contains(&self, offering_id: &str) -> bool {
        self.snapshot().contains_key(offering_id)
    }

    /// Consistent copy of the whole document. Read failures yield an empty
    /// document after logging.
    pub fn snapshot(&self) -> StatusDocument {
        match self.doc.read() {
            Ok(doc) => doc,
            Err(e) => {
                self.report(&e);
                StatusDocument::new()
            }
        }
    }

    /// Mark one user as filled. Returns whether the record is durable.
    pub fn mark_filled(&self, offering_id: &str, alias: &str) -> bool {
        self.mark_filled_bulk(offering_id, &[alias.to_string()])
    }

    /// Mark several users as filled in one write. Idempotent.
    pub fn mark_filled_bulk(&self, offering_id: &str, aliases: &[String]) -> bool {
        if aliases.is_empty() {
            return true;
        }
        let result = self.doc.update(|doc| {
            let users = doc.entry(offering_id.to_string()).or_default();
            for alias in aliases {
                users.insert(alias.clone(), true);
            }
        });
        match result {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Mark every tracked offering that is no longer available as filled for
    /// `aliases`, in a single read-modify-write.
    ///
    /// `is_available` is asked once per offering id present in the document;
    /// ids for which it returns `false` are marked. Returns the marked ids.
    pub fn mark_unavailable(
        &self,
        is_available: impl Fn(&str) -> bool,
        aliases: &[String],
    ) -> Vec<String> {
        let result = self.doc.update(|doc| {
            let mut marked = Vec::new();
            for (offering_id, users) in doc.iter_mut() {
                if is_available(offering_id) {
                    continue;
                }
                for alias in aliases {
                    users.insert(alias.clone(), true);
                }
                marked.push(offering_id.clone());
            }
            marked
        });
        match result {
            Ok(marked) => {
                if !marked.is_empty() {
                    info!(offerings = ?marked, aliases = ?aliases, "Marked unavailable offerings as filled");
                }
                marked
            }
            Err(e) => {
                self.report(&e);
                Vec::new()
            }
        }
    }

    fn report(&self, e: &StoreError) {
        error!(store = self.doc.name(), "Status store error: {}", e);
        metrics::record_store_error(self.doc.name(), e);
    }
}
