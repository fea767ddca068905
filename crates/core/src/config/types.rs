use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Config {
    /// Aliases of all configured accounts, in configuration order.
    pub fn user_aliases(&self) -> Vec<String> {
        self.users.iter().map(|u| u.alias.clone()).collect()
    }
}

/// Status endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Locations of the persisted state documents
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,
    #[serde(default = "default_ignore_path")]
    pub ignore_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            status_path: default_status_path(),
            ignore_path: default_ignore_path(),
        }
    }
}

fn default_status_path() -> PathBuf {
    PathBuf::from("ipo_status.json")
}

fn default_ignore_path() -> PathBuf {
    PathBuf::from("ipo_ignore.json")
}

/// Offering catalog HTTP source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog endpoint URL
    #[serde(default = "default_catalog_url")]
    pub url: String,
    /// Items requested per page (default: 30)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://www.nepalipaisa.com/api/GetIpos".to_string()
}

fn default_page_size() -> u32 {
    30
}

fn default_timeout() -> u32 {
    30
}

/// Depository portal back end
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Back-end API base URL
    #[serde(default = "default_portal_url")]
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Login attempts before a probe gives up (default: 10)
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: default_portal_url(),
            timeout_secs: default_timeout(),
            login_attempts: default_login_attempts(),
        }
    }
}

fn default_portal_url() -> String {
    "https://webbackend.cdsc.com.np/api".to_string()
}

fn default_login_attempts() -> u32 {
    10
}

/// Telegram operator channel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
    /// Chat the bot announces to and accepts replies from
    pub chat_id: String,
    /// Optional: only accept replies from this user id
    #[serde(default)]
    pub allowed_user_id: Option<String>,
    /// Bot API base URL (default: https://api.telegram.org)
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u32,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u32 {
    15
}

/// One portal account the bot applies for
#[derive(Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Unique display name, also the key in the status document
    pub alias: String,
    /// Depository participant code (e.g. "13700")
    pub dp_id: String,
    pub username: String,
    pub password: String,
    pub crn: String,
    pub txn_pin: String,
    /// Units to apply for (default: 10)
    #[serde(default = "default_apply_units")]
    pub apply_units: u32,
}

fn default_apply_units() -> u32 {
    10
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("alias", &self.alias)
            .field("dp_id", &self.dp_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("crn", &"<redacted>")
            .field("txn_pin", &"<redacted>")
            .field("apply_units", &self.apply_units)
            .finish()
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub state: StateConfig,
    pub engine: EngineConfig,
    pub catalog: CatalogConfig,
    pub portal: SanitizedPortalConfig,
    pub telegram: SanitizedTelegramConfig,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPortalConfig {
    pub url: String,
    pub login_attempts: u32,
}

/// Sanitized Telegram config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub chat_id: String,
    pub bot_token_configured: bool,
    pub allowed_user_id: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            state: config.state.clone(),
            engine: config.engine.clone(),
            catalog: config.catalog.clone(),
            portal: SanitizedPortalConfig {
                url: config.portal.url.clone(),
                login_attempts: config.portal.login_attempts,
            },
            telegram: SanitizedTelegramConfig {
                chat_id: config.telegram.chat_id.clone(),
                bot_token_configured: !config.telegram.bot_token.is_empty(),
                allowed_user_id: config.telegram.allowed_user_id.clone(),
            },
            users: config.user_aliases(),
        }
    }
}
