//! # Database State
//!
//! Wraps the `Database` handle for use in desk commands.
//!
//! ## Thread Safety
//! The `Database` struct from `libris-db` contains a `SqlitePool`, which is
//! thread-safe. Commands can run queries without explicit locking; the
//! multi-statement writes (issue, return, book edit) run in their own
//! transactions.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn search_books(
//!     db: &DbState,
//!     session: &Session,
//!     query: &str,
//! ) -> Result<Vec<BookListing>, ApiError> {
//!     Ok(db.inner().books().search(query).await?)
//! }
//! ```

use libris_db::{migrations, Database, DbConfig};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::ApiError;

/// Wrapper around `Database` for the desk's state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Wraps an open database.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens the database at `path`, applies migrations and makes sure an
    /// admin account exists.
    pub async fn open(path: PathBuf) -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::new(path)).await?;
        Self::prepare(db).await
    }

    /// A fresh in-memory database, prepared the same way as `open`.
    pub async fn in_memory() -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Self::prepare(db).await
    }

    async fn prepare(db: Database) -> Result<Self, ApiError> {
        let (embedded, applied) = migrations::migration_status(db.pool()).await?;
        debug!(embedded, applied, "Migration status");

        if db.users().ensure_default_admin().await? {
            info!("Default admin account created");
        }
        Ok(DbState { db })
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
