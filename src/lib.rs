#![deny(missing_docs)]
//! Mod Catalog Bot library.
//!
//! Telegram front-end for Modrinth search with a small persisted catalog of
//! saved mods.

/// Access control (allow-list and administrator capability).
pub mod access;
/// Telegram bot: controller, views, transport.
pub mod bot;
/// Persisted mod catalog (SQLite).
pub mod catalog;
/// Configuration management.
pub mod config;
/// Log output setup with token redaction.
pub mod logging;
/// Remote mod lookup providers.
pub mod lookup;
/// Per-user search sessions.
pub mod session;
/// Shutdown signalling between the bot and the hosting process.
pub mod shutdown;
/// Utility functions.
pub mod utils;

#[cfg(test)]
pub mod testing;
