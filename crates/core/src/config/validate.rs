use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Telegram section exists (enforced by serde)
/// - Server port is not 0
/// - At least one user, aliases non-empty and unique
/// - Engine intervals are non-zero and the reply poll fits in the reply window
/// - Reference time zone is a known IANA zone
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.telegram.chat_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.chat_id cannot be empty".to_string(),
        ));
    }

    if config.users.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one [[users]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if user.alias.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "users.alias cannot be empty".to_string(),
            ));
        }
        if !seen.insert(user.alias.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate user alias: {}",
                user.alias
            )));
        }
    }

    let engine = &config.engine;
    if engine.check_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.check_interval_secs cannot be 0".to_string(),
        ));
    }
    if engine.reply_timeout_secs == 0 || engine.reply_poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine reply timeout and poll interval must be positive".to_string(),
        ));
    }
    if engine.reply_poll_interval_secs > engine.reply_timeout_secs {
        return Err(ConfigError::ValidationError(
            "engine.reply_poll_interval_secs cannot exceed engine.reply_timeout_secs".to_string(),
        ));
    }
    if engine.ignore_hours == 0 {
        return Err(ConfigError::ValidationError(
            "engine.ignore_hours cannot be 0".to_string(),
        ));
    }
    engine
        .zone()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.portal.login_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "portal.login_attempts cannot be 0".to_string(),
        ));
    }

    Ok(())
}
