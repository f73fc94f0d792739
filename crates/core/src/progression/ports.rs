//! Port interfaces for progression persistence
//!
//! These traits define the boundaries between the progression engine and
//! the stores that hold user progress.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questlog_domain::{Result, Task, UserProgress};

/// Atomic write of one progression change
///
/// The task's completion state and the user's progress are written together
/// or not at all.
#[derive(Debug, Clone)]
pub struct ProgressCommit {
    /// New progress; its `version` is ignored and replaced by the store.
    pub progress: UserProgress,
    /// Version read before computing `progress`.
    pub expected_version: u64,
    /// Task whose completion state changed alongside the progress.
    pub task: Task,
}

/// Trait for persisting user progress
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the progress of `user_id`, creating a level-1 record stamped
    /// with `now` if none exists.
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProgress>;

    /// Write progress and task atomically.
    ///
    /// Fails with `ConcurrencyConflict` when the stored version no longer
    /// equals `expected_version`. Returns the progress as stored, with its
    /// bumped version.
    async fn commit(&self, commit: ProgressCommit) -> Result<UserProgress>;

    /// Delete the progress of `user_id` (account deletion).
    async fn delete(&self, user_id: &str) -> Result<()>;
}
