//! Pooled SQLite connections
//!
//! r2d2-based connection pooling. Pragmas from [`SqlitePoolConfig`] are
//! applied to every connection when it is opened.

pub mod config;
pub mod pool;

pub use config::SqlitePoolConfig;
pub use pool::{SqliteConnection, SqlitePool};
