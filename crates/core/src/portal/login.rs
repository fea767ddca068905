//! Bounded login retry.

use tracing::{info, warn};

use crate::config::UserConfig;

use super::{PortalError, PortalSession};

/// Authenticate with at most `attempts` tries.
///
/// Only errors for which [`PortalError::is_retryable_login`] holds are
/// retried; anything else is returned immediately. `attempts` of 0 is treated
/// as 1.
pub async fn authenticate_with_retry(
    session: &mut dyn PortalSession,
    user: &UserConfig,
    attempts: u32,
) -> Result<(), PortalError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match session.authenticate(user).await {
            Ok(()) => {
                info!(alias = %user.alias, attempt, "Logged in");
                return Ok(());
            }
            Err(e) if e.is_retryable_login() && attempt < attempts => {
                warn!(alias = %user.alias, attempt, attempts, "Login failed, retrying: {}", e);
                attempt += 1;
            }
            Err(e) => {
                warn!(alias = %user.alias, attempt, "Login failed: {}", e);
                return Err(e);
            }
        }
    }
}
