//! Offerings as fetched from the catalog, and the rules that decide which of
//! them are actionable right now.

mod eligibility;
mod types;

pub use eligibility::{is_category_eligible, is_open_on, EligibilityFilter};
pub use types::{category_rank, sort_by_priority, Offering, UnfilledOffering, UNKNOWN_RANK};
