//! Access control for bot users.
//!
//! Authorization is decided by Telegram username: members of the allow-list
//! may use the bot, and the configured administrator may additionally use
//! the destructive operations (deleting saved mods, restarting the bot).

use crate::config::Settings;
use std::collections::HashSet;

/// A Telegram user as seen by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Numeric Telegram user ID, used to key search sessions
    pub id: i64,
    /// Telegram username, used for access checks
    pub username: Option<String>,
}

impl Identity {
    /// Create an identity from a user ID and an optional username
    #[must_use]
    pub fn new(id: i64, username: Option<String>) -> Self {
        Self { id, username }
    }

    /// Username or a placeholder, for logs
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }
}

/// Username-based access policy
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed: HashSet<String>,
    admin: String,
}

impl AccessPolicy {
    /// Build a policy from an allow-list and the administrator username
    #[must_use]
    pub fn new<I, S>(allowed: I, admin: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            admin: admin.into(),
        }
    }

    /// Build a policy from the loaded settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.allowed_usernames(), settings.admin_username())
    }

    /// Whether the identity may use the bot at all
    #[must_use]
    pub fn is_authorized(&self, identity: &Identity) -> bool {
        identity
            .username
            .as_deref()
            .is_some_and(|name| self.allowed.contains(name) || self.is_admin_name(name))
    }

    /// Whether the identity may use administrative operations
    ///
    /// Allow-list membership alone does not grant this.
    #[must_use]
    pub fn is_administrator(&self, identity: &Identity) -> bool {
        identity
            .username
            .as_deref()
            .is_some_and(|name| self.is_admin_name(name))
    }

    fn is_admin_name(&self, name: &str) -> bool {
        !self.admin.is_empty() && name == self.admin
    }
}
