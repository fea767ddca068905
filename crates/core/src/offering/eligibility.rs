//! Eligibility rules.
//!
//! An offering is actionable when its category is a general public issue,
//! its status is open, and today's date in the reference zone falls inside
//! its application window.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use super::Offering;

/// Category check: general/public issue that is currently open.
pub fn is_category_eligible(offering: &Offering) -> bool {
    let share_type = offering.share_type.trim().to_lowercase();
    let public_issue = share_type.contains("general")
        || share_type.contains("public")
        || share_type == "ordinary";
    public_issue && offering.status.trim().eq_ignore_ascii_case("open")
}

/// Window check: `start_date <= date <= end_date`.
pub fn is_open_on(offering: &Offering, date: NaiveDate) -> bool {
    offering.start_date <= date && date <= offering.end_date
}

/// Classifies offerings against a fixed reference time zone.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityFilter {
    zone: Tz,
}

impl EligibilityFilter {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Current calendar date in the reference zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.zone).date_naive()
    }

    /// Whether the offering is actionable on the given local date.
    pub fn is_eligible_on(&self, offering: &Offering, today: NaiveDate) -> bool {
        if !is_category_eligible(offering) {
            debug!(
                offering_id = %offering.id,
                share_type = %offering.share_type,
                status = %offering.status,
                "Skipping non-eligible offering"
            );
            return false;
        }
        if !is_open_on(offering, today) {
            debug!(
                offering_id = %offering.id,
                start = %offering.start_date,
                end = %offering.end_date,
                today = %today,
                "Offering not open today"
            );
            return false;
        }
        true
    }

    /// Whether the offering is actionable right now.
    pub fn is_eligible(&self, offering: &Offering) -> bool {
        self.is_eligible_on(offering, self.today())
    }

    /// Eligible subset on the given date, input order preserved.
    pub fn filter_on(&self, offerings: &[Offering], today: NaiveDate) -> Vec<Offering> {
        offerings
            .iter()
            .filter(|o| self.is_eligible_on(o, today))
            .cloned()
            .collect()
    }

    /// Eligible subset right now, evaluated against a single "today".
    pub fn filter(&self, offerings: &[Offering]) -> Vec<Offering> {
        self.filter_on(offerings, self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offering(share_type: &str, status: &str) -> Offering {
        Offering::new(
            "1",
            "Alpha Corp",
            share_type,
            status,
            date(2024, 3, 10),
            date(2024, 3, 14),
        )
    }

    fn filter() -> EligibilityFilter {
        EligibilityFilter::new(chrono_tz::Asia::Kathmandu)
    }

    #[test]
    fn test_ordinary_open_in_window_is_eligible() {
        let o = offering("Ordinary", "Open");
        assert!(filter().is_eligible_on(&o, date(2024, 3, 12)));
    }

    #[test]
    fn test_closed_status_is_ineligible() {
        let o = offering("Ordinary", "Closed");
        assert!(!filter().is_eligible_on(&o, date(2024, 3, 12)));
    }

    #[test]
    fn test_outside_window_is_ineligible() {
        let o = offering("Ordinary", "Open");
        assert!(!filter().is_eligible_on(&o, date(2024, 3, 9)));
        assert!(!filter().is_eligible_on(&o, date(2024, 3, 15)));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let o = offering("Ordinary", "Open");
        assert!(filter().is_eligible_on(&o, date(2024, 3, 10)));
        assert!(filter().is_eligible_on(&o, date(2024, 3, 14)));
    }

    #[test]
    fn test_category_variants() {
        assert!(is_category_eligible(&offering("General Public", "open")));
        assert!(is_category_eligible(&offering("IPO for Public", "OPEN")));
        assert!(is_category_eligible(&offering("ORDINARY", "Open")));
        assert!(!is_category_eligible(&offering("Ordinary Preference", "Open")));
        assert!(!is_category_eligible(&offering("Local", "Open")));
        assert!(!is_category_eligible(&offering("Mutual Fund", "Open")));
    }

    #[test]
    fn test_filter_preserves_order() {
        let mut a = offering("Ordinary", "Open");
        a.id = "a".to_string();
        let mut b = offering("Local", "Open");
        b.id = "b".to_string();
        let mut c = offering("General", "Open");
        c.id = "c".to_string();

        let eligible = filter().filter_on(&[a, b, c], date(2024, 3, 11));
        let ids: Vec<_> = eligible.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
