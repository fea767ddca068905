//! Reconcile the status store against what the portal still shows.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::offering::Offering;
use crate::store::{IgnoreStore, StatusStore};

/// Catalog name for an offering id.
pub fn name_for_id<'a>(catalog: &'a [Offering], offering_id: &str) -> Option<&'a str> {
    catalog
        .iter()
        .find(|o| o.id == offering_id)
        .map(|o| o.company_name.as_str())
}

/// Catalog id for an offering name, compared after trimming.
pub fn id_for_name<'a>(catalog: &'a [Offering], name: &str) -> Option<&'a str> {
    let name = name.trim();
    catalog
        .iter()
        .find(|o| o.company_name.trim() == name)
        .map(|o| o.id.as_str())
}

/// Keeps the status store in line with upstream availability.
pub struct StatusReconciler {
    status: Arc<StatusStore>,
    ignore: Arc<IgnoreStore>,
}

impl StatusReconciler {
    pub fn new(status: Arc<StatusStore>, ignore: Arc<IgnoreStore>) -> Self {
        Self { status, ignore }
    }

    /// Mark every tracked offering that is no longer visible as open as filled
    /// for `aliases`.
    ///
    /// `open_names` are the issue names a completed probe saw. Only ids already
    /// present in the status store are considered; ids the catalog cannot name
    /// are left alone. Returns the ids marked.
    pub fn sync_availability<S: AsRef<str>>(
        &self,
        open_names: &[S],
        catalog: &[Offering],
        aliases: &[String],
    ) -> Vec<String> {
        let visible: HashSet<&str> = open_names.iter().map(|n| n.as_ref().trim()).collect();

        self.status.mark_unavailable(
            |offering_id| match name_for_id(catalog, offering_id) {
                Some(name) => visible.contains(name.trim()),
                None => {
                    debug!(offering_id, "Offering not in catalog, leaving status untouched");
                    true
                }
            },
            aliases,
        )
    }

    /// True only when none of `candidates` has a status or ignore record.
    ///
    /// An empty candidate list yields true; callers check emptiness first.
    pub fn needs_status_sync(&self, candidates: &[Offering]) -> bool {
        candidates
            .iter()
            .all(|o| !self.status.contains(&o.id) && !self.ignore.contains(&o.id))
    }
}
