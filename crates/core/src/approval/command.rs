//! Operator reply parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::offering::UnfilledOffering;

static IGNORE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:ignore|skip)\s+(.+)$").expect("ignore command pattern is valid")
});

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyCommand {
    /// Defer the offering matching the token.
    Ignore(String),
    /// Apply to the offering matching the token.
    Select(String),
}

impl ReplyCommand {
    pub fn token(&self) -> &str {
        match self {
            ReplyCommand::Ignore(token) | ReplyCommand::Select(token) => token,
        }
    }
}

/// Parse a raw reply. Matching is case-insensitive; blank replies yield `None`.
pub fn parse_reply(text: &str) -> Option<ReplyCommand> {
    let reply = text.trim().to_lowercase();
    if reply.is_empty() {
        return None;
    }
    if let Some(caps) = IGNORE_COMMAND.captures(&reply) {
        let token = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !token.is_empty() {
            return Some(ReplyCommand::Ignore(token.to_string()));
        }
    }
    Some(ReplyCommand::Select(reply))
}

/// First offering whose id or name contains `token`.
pub fn find_match<'a>(unfilled: &'a [UnfilledOffering], token: &str) -> Option<&'a UnfilledOffering> {
    unfilled.iter().find(|u| u.offering.matches_token(token))
}
