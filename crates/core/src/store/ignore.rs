//! Time-boxed operator deferrals.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{JsonDocument, StoreError};
use crate::metrics;

/// Default deferral window for `ignore` / `skip` replies.
pub const DEFAULT_IGNORE_HOURS: u32 = 24;

/// An offering suppressed from the action set until `until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreRecord {
    pub until: DateTime<Utc>,
}

impl IgnoreRecord {
    /// Active while `now < until`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.until
    }
}

/// `{offering_id: {"until": ...}}`
pub type IgnoreDocument = BTreeMap<String, IgnoreRecord>;

/// Durable offering deferrals with lazy and periodic expiry.
#[derive(Debug)]
pub struct IgnoreStore {
    doc: JsonDocument<IgnoreDocument>,
}

impl IgnoreStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new("ignore", path),
        }
    }

    /// Suppress `offering_id` for `duration` starting now.
    pub fn ignore(&self, offering_id: &str, duration: Duration) -> Option<DateTime<Utc>> {
        self.ignore_at(offering_id, duration, Utc::now())
    }

    /// Suppress `offering_id` until `now + duration`, replacing any existing
    /// record. Returns the expiry when it was persisted.
    pub fn ignore_at(
        &self,
        offering_id: &str,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let until = now + duration;
        let result = self.doc.update(|doc| {
            doc.insert(offering_id.to_string(), IgnoreRecord { until });
        });
        match result {
            Ok(()) => {
                info!(offering_id, %until, "Offering ignored");
                Some(until)
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Whether `offering_id` is suppressed at `now`.
    ///
    /// An expired record encountered here is treated as absent and deleted.
    pub fn is_ignored(&self, offering_id: &str, now: DateTime<Utc>) -> bool {
        let result = self.doc.update(|doc| match doc.get(offering_id) {
            Some(record) if record.is_active(now) => true,
            Some(_) => {
                doc.remove(offering_id);
                debug!(offering_id, "Evicted expired ignore record");
                false
            }
            None => false,
        });
        result.unwrap_or_else(|e| {
            self.report(&e);
            false
        })
    }

    /// Remove every record with `until <= now`. Returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let result = self.doc.update(|doc| {
            let before = doc.len();
            doc.retain(|_, record| record.is_active(now));
            before - doc.len()
        });
        match result {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed, "Swept expired ignore records");
                }
                removed
            }
            Err(e) => {
                self.report(&e);
                0
            }
        }
    }

    /// Whether any record (active or not yet evicted) exists for `offering_id`.
    pub fn contains(&self, offering_id: &str) -> bool {
        self.snapshot().contains_key(offering_id)
    }

    /// Consistent copy of the whole document.
    pub fn snapshot(&self) -> IgnoreDocument {
        match self.doc.read() {
            Ok(doc) => doc,
            Err(e) => {
                self.report(&e);
                IgnoreDocument::new()
            }
        }
    }

    fn report(&self, e: &StoreError) {
        error!(store = self.doc.name(), "Ignore store error: {}", e);
        metrics::record_store_error(self.doc.name(), e);
    }
}
