//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Questlog
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum QuestlogError {
    /// Malformed task data or an invalid update target.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The progress store detected a concurrent write to the same record.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The underlying store is unreachable or rejected the write.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Calendar sync failed. Never fatal to a completion change.
    #[error("Calendar sync failure: {0}")]
    SyncFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuestlogError {
    /// Whether the whole read-modify-write may be retried from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }

    /// Stable label suitable for logging fields and API error bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::ConcurrencyConflict(_) => "concurrency_conflict",
            Self::Persistence(_) => "persistence",
            Self::SyncFailure(_) => "sync_failure",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Questlog operations
pub type Result<T> = std::result::Result<T, QuestlogError>;
