//! Compute the set of offerings that still need action.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::offering::{Offering, UnfilledOffering};
use crate::store::{IgnoreStore, StatusStore};

/// Resolves eligible offerings into the per-offering outstanding users.
pub struct UnfilledResolver {
    status: Arc<StatusStore>,
    ignore: Arc<IgnoreStore>,
}

impl UnfilledResolver {
    pub fn new(status: Arc<StatusStore>, ignore: Arc<IgnoreStore>) -> Self {
        Self { status, ignore }
    }

    /// Eligible offerings, in input order, that are not ignored at `now` and
    /// have at least one alias without a fill record.
    pub fn resolve_unfilled(
        &self,
        eligible: &[Offering],
        aliases: &[String],
        now: DateTime<Utc>,
    ) -> Vec<UnfilledOffering> {
        eligible
            .iter()
            .filter_map(|offering| {
                if self.ignore.is_ignored(&offering.id, now) {
                    debug!(offering_id = %offering.id, "Offering is ignored");
                    return None;
                }
                let unfilled_users: Vec<String> = aliases
                    .iter()
                    .filter(|alias| !self.status.is_filled(&offering.id, alias))
                    .cloned()
                    .collect();
                if unfilled_users.is_empty() {
                    return None;
                }
                Some(UnfilledOffering {
                    offering: offering.clone(),
                    unfilled_users,
                })
            })
            .collect()
    }
}
