//! Testing utilities and mock implementations of the engine's collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use ipobot_core::testing::{fixtures, MockCatalog, MockNotifier, MockPortal};
//!
//! let catalog = MockCatalog::with_offerings(vec![fixtures::offering("1", "Alpha Corp")]);
//! let portal = MockPortal::new();
//! portal.set_open_issues(vec![fixtures::open_issue(1, "Alpha Corp")]).await;
//! let notifier = MockNotifier::new();
//! notifier.push_reply("alpha").await;
//! ```

mod mock_catalog;
mod mock_notifier;
mod mock_portal;

pub use mock_catalog::MockCatalog;
pub use mock_notifier::{MockNotifier, MOCK_CHAT_ID};
pub use mock_portal::{MockPortal, PortalStage, RecordedApplication};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::config::UserConfig;
    use crate::offering::{Offering, UnfilledOffering};
    use crate::portal::{OpenIssue, APPLY_ACTION};

    /// A user with placeholder credentials.
    pub fn user(alias: &str) -> UserConfig {
        UserConfig {
            alias: alias.to_string(),
            dp_id: "13700".to_string(),
            username: "123456".to_string(),
            password: "secret".to_string(),
            crn: "CRN-1".to_string(),
            txn_pin: "1234".to_string(),
            apply_units: 10,
        }
    }

    /// An ordinary, open offering whose window spans today in every zone.
    pub fn offering(id: &str, company_name: &str) -> Offering {
        let today = Utc::now().date_naive();
        Offering::new(
            id,
            company_name,
            "ordinary",
            "Open",
            today - Duration::days(2),
            today + Duration::days(2),
        )
    }

    /// An offering whose window ended last week.
    pub fn past_offering(id: &str, company_name: &str) -> Offering {
        let today = Utc::now().date_naive();
        Offering::new(
            id,
            company_name,
            "ordinary",
            "Open",
            today - Duration::days(10),
            today - Duration::days(7),
        )
    }

    pub fn unfilled(id: &str, company_name: &str, users: &[&str]) -> UnfilledOffering {
        UnfilledOffering {
            offering: offering(id, company_name),
            unfilled_users: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    /// A portal row for an ordinary-share IPO still offering "Apply".
    pub fn open_issue(index: usize, name: &str) -> OpenIssue {
        OpenIssue {
            index,
            name: name.to_string(),
            issued_for: "General Public".to_string(),
            ticker: name
                .split_whitespace()
                .next()
                .unwrap_or(name)
                .to_uppercase(),
            issue_type: "IPO".to_string(),
            share_type: "Ordinary Shares".to_string(),
            action: APPLY_ACTION.to_string(),
        }
    }
}
