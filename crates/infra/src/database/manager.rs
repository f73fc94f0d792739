//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use questlog_common::storage::sqlite::SqliteConnection;
use questlog_common::{SqlitePool, SqlitePoolConfig};
use questlog_domain::{DatabaseConfig, Result};
use rusqlite::params;
use tracing::info;

use crate::errors::to_domain;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: Arc<SqlitePool>,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path` with up to `pool_size`
    /// connections.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the pool cannot be built.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        Self::with_pool_config(db_path, SqlitePoolConfig::with_max_size(pool_size.max(1)))
    }

    /// Open the database with explicit pool settings.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the pool cannot be built.
    pub fn with_pool_config<P: AsRef<Path>>(db_path: P, config: SqlitePoolConfig) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let max_connections = config.max_size;
        let pool = SqlitePool::new(&path, config).map_err(to_domain)?;

        info!(db_path = %path.display(), max_connections, "sqlite pool initialised");

        Ok(Self { pool: Arc::new(pool), path })
    }

    /// Open and migrate the database described by `config`.
    ///
    /// # Errors
    /// See [`DbManager::with_pool_config`] and [`DbManager::run_migrations`].
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let manager = Self::with_pool_config(&config.path, pool_config(config))?;
        manager.run_migrations()?;
        Ok(manager)
    }

    /// Open the database and make sure the schema exists.
    ///
    /// # Errors
    /// See [`DbManager::new`] and [`DbManager::run_migrations`].
    pub fn open<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let manager = Self::new(db_path, pool_size)?;
        manager.run_migrations()?;
        Ok(manager)
    }

    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Acquire a pooled connection.
    ///
    /// # Errors
    /// `Persistence` when no connection became available in time.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get_connection().map_err(to_domain)
    }

    /// Ensure the full schema exists on the current database.
    ///
    /// # Errors
    /// Any SQL failure while applying the schema.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(to_domain)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER) * 1000)",
            params![SCHEMA_VERSION],
        )
        .map_err(to_domain)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database answers a trivial query.
    ///
    /// # Errors
    /// `Persistence` when the database is unreachable.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0)).map_err(to_domain)?;
        Ok(())
    }
}

fn pool_config(config: &DatabaseConfig) -> SqlitePoolConfig {
    SqlitePoolConfig {
        busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        ..SqlitePoolConfig::with_max_size(config.pool_size.max(1))
    }
}
