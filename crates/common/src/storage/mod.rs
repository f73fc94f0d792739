//! Storage primitives for SQLite-backed repositories
//!
//! This module provides the pooled connection layer used by infrastructure
//! repositories. Schema management belongs to the application layer.

pub mod error;
pub mod sqlite;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use sqlite::{SqliteConnection, SqlitePool, SqlitePoolConfig};
