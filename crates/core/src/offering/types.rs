//! Offering types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rank assigned to share types and statuses the catalog order does not know.
pub const UNKNOWN_RANK: u32 = 999;

/// A public share issuance as reported by the catalog.
///
/// Only `id` and `company_name` are ever used as keys into persisted state;
/// everything else is re-fetched every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Stable catalog key.
    pub id: String,
    pub company_name: String,
    /// Category tag, e.g. "Ordinary", "General Public".
    pub share_type: String,
    /// Lifecycle tag: "Open", "Nearing", "Closed".
    pub status: String,
    /// First day of the application window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the application window (inclusive).
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u64>,
}

impl Offering {
    /// Create an offering with the fields the engine relies on.
    pub fn new(
        id: impl Into<String>,
        company_name: impl Into<String>,
        share_type: impl Into<String>,
        status: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            share_type: share_type.into(),
            status: status.into(),
            start_date,
            end_date,
            stock_symbol: None,
            sector_name: None,
            price_per_unit: None,
            units: None,
        }
    }

    /// Whether a lower-cased operator token is a substring of the id or name.
    pub fn matches_token(&self, token: &str) -> bool {
        !token.is_empty()
            && (self.id.to_lowercase().contains(token)
                || self.company_name.to_lowercase().contains(token))
    }
}

/// An eligible offering annotated with the users that still need to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfilledOffering {
    #[serde(flatten)]
    pub offering: Offering,
    pub unfilled_users: Vec<String>,
}

impl UnfilledOffering {
    pub fn id(&self) -> &str {
        &self.offering.id
    }

    pub fn company_name(&self) -> &str {
        &self.offering.company_name
    }
}

/// Display priority of a share type or status tag.
///
/// ordinary/open = 0, nearing = 1, closed = 2, anything else = [`UNKNOWN_RANK`].
pub fn category_rank(tag: &str) -> u32 {
    match tag.trim().to_lowercase().as_str() {
        "ordinary" | "open" => 0,
        "nearing" => 1,
        "closed" => 2,
        _ => UNKNOWN_RANK,
    }
}

/// Stable sort by `(rank(share_type), rank(status))`.
pub fn sort_by_priority(offerings: &mut [Offering]) {
    offerings.sort_by_key(|o| (category_rank(&o.share_type), category_rank(&o.status)));
}
