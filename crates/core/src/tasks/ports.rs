//! Port interfaces for tasks and calendar sync

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questlog_domain::{Result, Task, TaskFilter};

/// One completed task in a user's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub task_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Trait for persisting tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Find a task by id, regardless of owner.
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>>;

    /// Insert or replace a task.
    async fn save_task(&self, task: &Task) -> Result<()>;

    /// List the tasks of `user_id` matching `filter`, oldest first.
    async fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>>;

    /// Delete a task; returns whether it existed.
    async fn delete_task(&self, task_id: &str) -> Result<bool>;

    /// Every currently completed task of `user_id`.
    async fn completion_history(&self, user_id: &str) -> Result<Vec<CompletionRecord>>;
}

/// Trait for mirroring tasks into an external calendar
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Create or update the event for `task`, returning the event id.
    async fn sync_event(&self, task: &Task) -> Result<String>;

    /// Remove a previously synced event.
    async fn remove_event(&self, event_id: &str) -> Result<()>;
}
