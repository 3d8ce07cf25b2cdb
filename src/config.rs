//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the bot's tuning constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    #[serde(default)]
    pub telegram_token: String,

    /// Telegram username of the bot administrator (without `@`)
    #[serde(default)]
    pub admin_username: String,

    /// Comma-separated list of Telegram usernames allowed to use the bot
    #[serde(rename = "allowed_usernames", default = "default_allowed_usernames")]
    pub allowed_usernames_str: String,

    /// Path to the SQLite catalog database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Base URL of the Modrinth REST API
    #[serde(default = "default_modrinth_api_url")]
    pub modrinth_api_url: String,

    /// Base URL of the Modrinth website, used for download links
    #[serde(default = "default_modrinth_site_url")]
    pub modrinth_site_url: String,
}

fn default_allowed_usernames() -> String {
    "Keptchypk,I_am_kil1ed".to_string()
}

fn default_database_path() -> String {
    "mods.db".to_string()
}

fn default_modrinth_api_url() -> String {
    "https://api.modrinth.com/v2".to_string()
}

fn default_modrinth_site_url() -> String {
    "https://modrinth.com".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mod_catalog_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token or the
    /// administrator username is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__ADMIN_USERNAME=someone ./target/app`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables map onto snake_case keys
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // The bot historically read its token from BOT_TOKEN
        if settings.telegram_token.is_empty() {
            if let Ok(val) = std::env::var("BOT_TOKEN") {
                if !val.is_empty() {
                    settings.telegram_token = val;
                }
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings required to run the bot are present.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::Message` naming the first missing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_TOKEN (or BOT_TOKEN) is missing".into(),
            ));
        }
        if self.admin_username().is_empty() {
            return Err(ConfigError::Message("ADMIN_USERNAME is missing".into()));
        }
        Ok(())
    }

    /// Administrator username with surrounding whitespace and `@` removed
    #[must_use]
    pub fn admin_username(&self) -> String {
        normalize_username(&self.admin_username)
    }

    /// Returns the set of Telegram usernames that are allowed to use the bot
    #[must_use]
    pub fn allowed_usernames(&self) -> HashSet<String> {
        self.allowed_usernames_str
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(normalize_username)
            .filter(|token| !token.is_empty())
            .collect()
    }
}

fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_string()
}

/// Maximum number of search hits kept per query
pub const SEARCH_RESULT_LIMIT: usize = 10;
/// Number of saved mods shown per catalog page
pub const CATALOG_PAGE_SIZE: usize = 10;

/// Default HTTP timeout for Modrinth requests, in seconds
pub const MODRINTH_HTTP_TIMEOUT_SECS: u64 = 30;
/// User agent sent to Modrinth, which asks clients to identify themselves
pub const MODRINTH_USER_AGENT: &str = concat!("mod-catalog-bot/", env!("CARGO_PKG_VERSION"));

/// Initial backoff for retried Telegram API calls
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for a single backoff delay
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Retries after the first failed Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Get Modrinth HTTP timeout from env or default.
///
/// Environment variable: `MODRINTH_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_modrinth_http_timeout_secs() -> u64 {
    std::env::var("MODRINTH_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(MODRINTH_HTTP_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            admin_username: "boss".to_string(),
            allowed_usernames_str: String::new(),
            database_path: default_database_path(),
            modrinth_api_url: default_modrinth_api_url(),
            modrinth_site_url: default_modrinth_site_url(),
        }
    }

    #[test]
    fn test_list_parsing() {
        let mut settings = settings();

        settings.allowed_usernames_str = "alice,bob".to_string();
        let allowed = settings.allowed_usernames();
        assert!(allowed.contains("alice"));
        assert!(allowed.contains("bob"));
        assert_eq!(allowed.len(), 2);

        settings.allowed_usernames_str = "carol dave".to_string();
        assert_eq!(settings.allowed_usernames().len(), 2);

        // Mixed separators and @-prefixed handles
        settings.allowed_usernames_str = "@erin; frank, ,grace".to_string();
        let allowed = settings.allowed_usernames();
        assert!(allowed.contains("erin"));
        assert!(allowed.contains("frank"));
        assert!(allowed.contains("grace"));
        assert_eq!(allowed.len(), 3);
    }

    #[test]
    fn test_default_allow_list() {
        let mut settings = settings();
        settings.allowed_usernames_str = default_allowed_usernames();
        let allowed = settings.allowed_usernames();
        assert!(allowed.contains("Keptchypk"));
        assert!(allowed.contains("I_am_kil1ed"));
    }

    #[test]
    fn test_validate_requires_token_and_admin() {
        let mut s = settings();
        assert!(s.validate().is_ok());

        s.admin_username = " @ ".to_string();
        assert!(s.validate().is_err());

        let mut s = settings();
        s.telegram_token = "  ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_admin_username_normalized() {
        let mut s = settings();
        s.admin_username = " @boss ".to_string();
        assert_eq!(s.admin_username(), "boss");
    }
}
