//! Engine configuration.

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_IGNORE_HOURS;

use super::EngineError;

/// Configuration for the polling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sleep between cycles, in seconds.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Sleep after a failed cycle, in seconds.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// How long to wait for an operator reply, in seconds.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,

    /// How often to poll for a reply while waiting, in seconds.
    #[serde(default = "default_reply_poll_interval")]
    pub reply_poll_interval_secs: u64,

    /// How long an `ignore` reply defers an offering, in hours.
    #[serde(default = "default_ignore_hours")]
    pub ignore_hours: u32,

    /// IANA zone used for every "is it open today" decision.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Probe and reconcile but never submit applications.
    #[serde(default)]
    pub dry_run: bool,

    /// Portal share category applications are submitted for.
    #[serde(default = "default_share_category")]
    pub share_category: String,
}

fn default_check_interval() -> u64 {
    60
}

fn default_error_backoff() -> u64 {
    60
}

fn default_reply_timeout() -> u64 {
    600
}

fn default_reply_poll_interval() -> u64 {
    2
}

fn default_ignore_hours() -> u32 {
    DEFAULT_IGNORE_HOURS
}

fn default_timezone() -> String {
    "Asia/Kathmandu".to_string()
}

fn default_share_category() -> String {
    "Ordinary Shares".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            error_backoff_secs: default_error_backoff(),
            reply_timeout_secs: default_reply_timeout(),
            reply_poll_interval_secs: default_reply_poll_interval(),
            ignore_hours: default_ignore_hours(),
            timezone: default_timezone(),
            dry_run: false,
            share_category: default_share_category(),
        }
    }
}

impl EngineConfig {
    /// Parse the configured reference zone.
    pub fn zone(&self) -> Result<Tz, EngineError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| EngineError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn timing(&self) -> EngineTiming {
        EngineTiming {
            check_interval: Duration::from_secs(self.check_interval_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            reply_timeout: Duration::from_secs(self.reply_timeout_secs),
            reply_poll_interval: Duration::from_secs(self.reply_poll_interval_secs),
        }
    }
}

/// Engine waits as durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    pub check_interval: Duration,
    pub error_backoff: Duration,
    pub reply_timeout: Duration,
    pub reply_poll_interval: Duration,
}
