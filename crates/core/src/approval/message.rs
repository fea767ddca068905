//! Operator-facing message text.

use crate::offering::UnfilledOffering;

/// Announcement listing every unfilled offering and the reply syntax.
pub fn announcement(unfilled: &[UnfilledOffering], ignore_hours: u32) -> String {
    let mut lines = vec![
        "*IPO Alert!* The following IPOs are available and not filled for all users:".to_string(),
    ];
    lines.extend(unfilled.iter().map(|u| {
        format!(
            "- {} (ID: {}) | Unfilled users: {}",
            u.company_name(),
            u.id(),
            u.unfilled_users.join(", ")
        )
    }));
    lines.push(format!(
        "\nReply with the IPO name or ID to proceed, or 'ignore <id>' to skip for {}h.",
        ignore_hours
    ));
    lines.join("\n")
}

pub fn ignore_confirmation(target: &UnfilledOffering, ignore_hours: u32) -> String {
    format!(
        "IPO {} (ID: {}) will be ignored for {} hours.",
        target.company_name(),
        target.id(),
        ignore_hours
    )
}

pub fn no_match(reply: &str) -> String {
    format!("No matching IPO found for '{}'. Please try again.", reply)
}
