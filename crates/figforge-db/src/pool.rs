//! # Database Handle
//!
//! Opens the SQLite store behind the configurator catalog, applies the
//! schema, and hands out the catalog and torso bag repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig { storage, max_connections }                                 │
//! │       │                                                                 │
//! │       ├── Storage::File(path)   WAL, created if missing, N connections  │
//! │       └── Storage::Memory       one connection kept open for the pool   │
//! │                                 lifetime (closing it drops the data)    │
//! │       ▼                                                                 │
//! │  Database::new ──► SqlitePool ──► MIGRATOR ──► ready                    │
//! │                                                                         │
//! │  db.catalog()     list_* for CatalogSource, insert_* for seeding        │
//! │  db.torso_bags()  save_order / upsert for TorsoBagStore                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::torso_bag::TorsoBagRepository;

/// Pool size for file-backed databases unless configured otherwise.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    Memory,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::File(path) => write!(f, "{}", path.display()),
            Storage::Memory => f.write_str(":memory:"),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,
    pub max_connections: u32,
}

impl DbConfig {
    /// File-backed catalog at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Private in-memory catalog, used by tests and demos.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
        }
    }

    /// Sets the pool size. An in-memory catalog always uses one connection,
    /// since every SQLite connection to `:memory:` is a separate database.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = match self.storage {
            Storage::Memory => 1,
            Storage::File(_) => max.max(1),
        };
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.storage {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        // Item rows cascade from their bag / add-on
        Ok(options.foreign_keys(true).busy_timeout(BUSY_TIMEOUT))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().max_connections(self.max_connections);
        match self.storage {
            Storage::File(_) => options,
            Storage::Memory => options
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>),
        }
    }
}

/// Handle to the catalog store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        info!(
            storage = %config.storage,
            max_connections = config.max_connections,
            "Catalog database ready"
        );
        Ok(Database { pool })
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    pub fn torso_bags(&self) -> TorsoBagRepository {
        TorsoBagRepository::new(self.pool.clone())
    }

    /// Waits for outstanding queries, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figforge_core::BundleTier;

    #[test]
    fn test_memory_is_single_connection() {
        assert_eq!(DbConfig::in_memory().max_connections(8).max_connections, 1);
        assert_eq!(DbConfig::new("x.db").max_connections(0).max_connections, 1);
        assert_eq!(DbConfig::new("x.db").max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn test_memory_catalog_shared_by_repositories() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_bundle(&BundleTier::new("b-100", "100", 100, 150, 15_000))
            .await
            .unwrap();

        let clone = db.clone();
        assert_eq!(clone.catalog().list_bundles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_catalog_survives_reopen() {
        let path = std::env::temp_dir().join(format!("figforge-{}.db", uuid::Uuid::new_v4()));

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.catalog()
            .insert_bundle(&BundleTier::new("b-200", "200", 200, 125, 25_000))
            .await
            .unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let bundles = reopened.catalog().list_bundles().await.unwrap();
        assert_eq!(bundles[0].id, "b-200");
        reopened.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
