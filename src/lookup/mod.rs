//! Remote mod lookup
//!
//! Defines the interface the bot uses to search for mods and resolve a
//! single project, plus the Modrinth implementation.

use crate::catalog::ModRecord;
use thiserror::Error;

/// Modrinth REST implementation
pub mod modrinth;

pub use modrinth::ModrinthClient;

/// Description shown for search hits that carry none
pub const DEFAULT_DESCRIPTION: &str = "Описание отсутствует.";

/// Errors that can occur during lookups
#[derive(Debug, Error)]
pub enum LookupError {
    /// The provider answered with a non-success status
    #[error("Provider unavailable: HTTP {0}")]
    ProviderUnavailable(u16),
    /// The provider found nothing for the query
    #[error("No results")]
    NoResults,
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(String),
    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// A search hit, kept only in the searching user's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMod {
    /// Modrinth project ID
    pub id: String,
    /// Project title
    pub name: String,
    /// Short description or [`DEFAULT_DESCRIPTION`]
    pub description: String,
    /// Link to the project page
    pub download_url: String,
}

/// Interface for mod lookup providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LookupProvider: Send + Sync {
    /// Search by free text; returns at most
    /// [`SEARCH_RESULT_LIMIT`](crate::config::SEARCH_RESULT_LIMIT) hits in
    /// ranking order, or `NoResults` when there are none
    async fn search(&self, query: &str) -> Result<Vec<CandidateMod>, LookupError>;

    /// Resolve the full record for a single project
    async fn fetch_by_id(&self, id: &str) -> Result<ModRecord, LookupError>;
}
