//! In-memory store for tasks and progress
//!
//! Backs the `memory` storage backend and tests that do not need a
//! database file. State is lost when the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use questlog_core::{CompletionRecord, ProgressCommit, ProgressRepository, TaskRepository};
use questlog_domain::{QuestlogError, Result, Task, TaskFilter, UserProgress};

#[derive(Default)]
struct MemoryState {
    tasks: HashMap<String, Task>,
    progress: HashMap<String, UserProgress>,
}

/// Task and progress store held in process memory.
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_count(&self) -> usize {
        self.state.read().tasks.len()
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.state.read().tasks.get(task_id).cloned())
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        self.state.write().tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        let state = self.state.read();
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_owned_by(user_id) && filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool> {
        Ok(self.state.write().tasks.remove(task_id).is_some())
    }

    async fn completion_history(&self, user_id: &str) -> Result<Vec<CompletionRecord>> {
        let state = self.state.read();
        let mut history: Vec<CompletionRecord> = state
            .tasks
            .values()
            .filter(|task| task.is_owned_by(user_id))
            .filter_map(|task| {
                task.completed_at
                    .map(|completed_at| CompletionRecord { task_id: task.id.clone(), completed_at })
            })
            .collect();
        history.sort_by_key(|record| record.completed_at);
        Ok(history)
    }
}

#[async_trait]
impl ProgressRepository for MemoryStore {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProgress> {
        let mut state = self.state.write();
        let progress = state
            .progress
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id, now));
        Ok(progress.clone())
    }

    async fn commit(&self, commit: ProgressCommit) -> Result<UserProgress> {
        commit.task.validate()?;
        let ProgressCommit { mut progress, expected_version, task } = commit;

        let mut state = self.state.write();
        let current = state.progress.get(&progress.user_id).map_or(0, |p| p.version);
        if current != expected_version {
            return Err(QuestlogError::ConcurrencyConflict(format!(
                "progress of user {} is at version {current}, expected {expected_version}",
                progress.user_id
            )));
        }

        progress.version = current + 1;
        state.tasks.insert(task.id.clone(), task);
        state.progress.insert(progress.user_id.clone(), progress.clone());
        Ok(progress)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.state.write().progress.remove(user_id);
        Ok(())
    }
}
