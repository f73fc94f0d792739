//! SQLite connection pool
//!
//! Every connection is prepared once when r2d2 opens it: busy timeout
//! first, so the journal switch itself can wait out a concurrent writer,
//! then journal mode and foreign keys.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use crate::storage::error::{StorageError, StorageResult};

/// Connection checked out of a [`SqlitePool`], returned to it on drop.
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite connection pool
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Open a pool on the database file at `path`, creating it if needed.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty pool, `Connection` when the first
    /// connection cannot be opened and prepared.
    #[instrument(skip(config), fields(db_path = %path.display(), pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        if config.max_size == 0 {
            return Err(StorageError::InvalidConfig("pool size must be at least 1".into()));
        }

        let prepare = config.clone();
        let manager = SqliteConnectionManager::file(path)
            .with_init(move |conn| prepare_connection(conn, &prepare));

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|err| StorageError::Connection(format!("cannot open pool: {err}")))?;

        info!(busy_timeout = ?config.busy_timeout, wal = config.wal, "SQLite pool ready");
        Ok(Self { pool, config })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// `Timeout` when none became free within `connection_timeout`.
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        self.pool.get().map_err(|err| {
            warn!(error = %err, "no pooled connection available");
            StorageError::Timeout(self.config.connection_timeout.as_secs())
        })
    }

    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }

    /// `(open, idle)` connection counts.
    pub fn state(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }
}

fn prepare_connection(conn: &mut Connection, config: &SqlitePoolConfig) -> rusqlite::Result<()> {
    conn.busy_timeout(config.busy_timeout)?;

    if config.wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            // In-memory and some network filesystems refuse WAL.
            debug!(mode = %mode, "WAL not available, keeping journal mode");
        }
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }

    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    Ok(())
}
