//! Persisted catalog of saved mods
//!
//! Provides the `Catalog` interface and an SQLite-backed implementation.
//! Rows live in a single `mods(id, name, url)` table and are listed in
//! insertion order.

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Errors that can occur during catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A mod with this ID is already saved
    #[error("mod {0} is already saved")]
    DuplicateKey(String),
    /// Error reported by SQLite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// A previous holder of the connection panicked
    #[error("Database connection lock poisoned")]
    Poisoned,
    /// The blocking worker running the query failed
    #[error("Database task failed: {0}")]
    Task(String),
}

/// A saved mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRecord {
    /// Modrinth project ID
    pub id: String,
    /// Project title
    pub name: String,
    /// Link to the project page
    pub download_url: String,
}

/// Interface for the saved-mod catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All saved mods in insertion order
    async fn list_all(&self) -> Result<Vec<ModRecord>, CatalogError>;
    /// Whether a mod with this ID is saved
    async fn exists(&self, id: &str) -> Result<bool, CatalogError>;
    /// Load a single saved mod
    async fn get(&self, id: &str) -> Result<Option<ModRecord>, CatalogError>;
    /// Save a mod; fails with `DuplicateKey` if the ID is already present
    async fn insert(&self, record: ModRecord) -> Result<(), CatalogError>;
    /// Remove a mod; removing an absent ID is not an error
    async fn remove(&self, id: &str) -> Result<(), CatalogError>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS mods (
    id TEXT PRIMARY KEY,
    name TEXT,
    url TEXT
)";

/// SQLite-backed catalog
///
/// The connection is shared behind a mutex and every query runs on the
/// blocking thread pool, so concurrent callers are serialized per statement.
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened mod catalog at {}", path.display());
        Self::with_connection(conn)
    }

    /// Open a private in-memory catalog
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails to initialize.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Connection) -> Result<T, CatalogError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| CatalogError::Poisoned)?;
            op(&guard)
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))?
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn list_all(&self) -> Result<Vec<ModRecord>, CatalogError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, url FROM mods ORDER BY rowid")?;
            let rows = stmt.query_map([], |row| {
                Ok(ModRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    download_url: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn exists(&self, id: &str) -> Result<bool, CatalogError> {
        let id = id.to_string();
        self.run(move |conn| {
            let found = conn
                .query_row("SELECT 1 FROM mods WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<ModRecord>, CatalogError> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, url FROM mods WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(ModRecord {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            download_url: row.get(2)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn insert(&self, record: ModRecord) -> Result<(), CatalogError> {
        self.run(move |conn| {
            match conn.execute(
                "INSERT INTO mods (id, name, url) VALUES (?1, ?2, ?3)",
                params![record.id, record.name, record.download_url],
            ) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(CatalogError::DuplicateKey(record.id))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<(), CatalogError> {
        let id = id.to_string();
        self.run(move |conn| {
            conn.execute("DELETE FROM mods WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }
}
