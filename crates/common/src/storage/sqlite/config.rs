//! SQLite pool settings

use std::time::Duration;

/// Pool size, timeouts and per-connection pragmas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlitePoolConfig {
    pub max_size: u32,
    /// How long `get_connection` waits for a free connection.
    pub connection_timeout: Duration,
    /// How long a statement waits on another connection's write lock
    /// before failing with `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Use the WAL journal, so readers never block the writer.
    pub wal: bool,
    pub foreign_keys: bool,
}

impl SqlitePoolConfig {
    /// Defaults with `max_size` connections.
    pub fn with_max_size(max_size: u32) -> Self {
        Self { max_size, ..Self::default() }
    }
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            wal: true,
            foreign_keys: true,
        }
    }
}
