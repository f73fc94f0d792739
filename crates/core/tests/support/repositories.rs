use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questlog_core::{CompletionRecord, ProgressCommit, ProgressRepository, TaskRepository};
use questlog_domain::{QuestlogError, Result, Task, TaskFilter, UserProgress};
use tokio::sync::Notify;

/// Signals around a commit held open by [`InMemoryStore::pause_after_next_commit`].
#[derive(Clone, Default)]
pub struct CommitPause {
    /// Notified once the paused commit has been written.
    pub reached: Arc<Notify>,
    /// Notify to let the paused commit return.
    pub resume: Arc<Notify>,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    progress: HashMap<String, UserProgress>,
    injected_conflicts: u32,
    failing_commits: bool,
    commits: u32,
    rejected_commits: u32,
    pause_after_commit: Option<CommitPause>,
}

/// In-memory task and progress store.
///
/// Implements both repositories over one lock so a commit writes task and
/// progress together, like the SQLite transaction does. Conflicts and
/// persistence failures can be injected.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `task`, replacing any task with the same id.
    pub fn seed_task(&self, task: Task) {
        let mut state = self.state.lock().unwrap();
        state.tasks.retain(|t| t.id != task.id);
        state.tasks.push(task);
    }

    pub fn seed_progress(&self, progress: UserProgress) {
        self.state.lock().unwrap().progress.insert(progress.user_id.clone(), progress);
    }

    pub fn progress_of(&self, user_id: &str) -> Option<UserProgress> {
        self.state.lock().unwrap().progress.get(user_id).cloned()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.state.lock().unwrap().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    /// Make the next `count` commits fail with a concurrency conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.state.lock().unwrap().injected_conflicts = count;
    }

    /// Make every commit fail with a persistence error until reset.
    pub fn fail_commits(&self, failing: bool) {
        self.state.lock().unwrap().failing_commits = failing;
    }

    /// Hold the next successful commit open after it is written, until
    /// the returned pause is resumed.
    pub fn pause_after_next_commit(&self) -> CommitPause {
        let pause = CommitPause::default();
        self.state.lock().unwrap().pause_after_commit = Some(pause.clone());
        pause
    }

    pub fn commit_count(&self) -> u32 {
        self.state.lock().unwrap().commits
    }

    pub fn rejected_commit_count(&self) -> u32 {
        self.state.lock().unwrap().rejected_commits
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.task(task_id))
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.tasks.iter().position(|t| t.id == task.id) {
            Some(index) => state.tasks[index] = task.clone(),
            None => state.tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.is_owned_by(user_id) && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        Ok(state.tasks.len() != before)
    }

    async fn completion_history(&self, user_id: &str) -> Result<Vec<CompletionRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.is_owned_by(user_id))
            .filter_map(|t| {
                t.completed_at
                    .map(|completed_at| CompletionRecord { task_id: t.id.clone(), completed_at })
            })
            .collect())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryStore {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProgress> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .progress
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id, now))
            .clone())
    }

    async fn commit(&self, commit: ProgressCommit) -> Result<UserProgress> {
        // Let other tasks interleave between the read and the write.
        tokio::task::yield_now().await;

        let (stored, pause) = {
            let mut state = self.state.lock().unwrap();
            if state.failing_commits {
                state.rejected_commits += 1;
                return Err(QuestlogError::Persistence("disk I/O error".into()));
            }
            if state.injected_conflicts > 0 {
                state.injected_conflicts -= 1;
                state.rejected_commits += 1;
                return Err(QuestlogError::ConcurrencyConflict("injected".into()));
            }

            let user_id = commit.progress.user_id.clone();
            let stored_version = state.progress.get(&user_id).map_or(0, |p| p.version);
            if stored_version != commit.expected_version {
                state.rejected_commits += 1;
                return Err(QuestlogError::ConcurrencyConflict(format!(
                    "progress of {user_id} is at version {stored_version}"
                )));
            }

            let mut progress = commit.progress;
            progress.version = stored_version + 1;
            state.progress.insert(user_id, progress.clone());
            match state.tasks.iter().position(|t| t.id == commit.task.id) {
                Some(index) => state.tasks[index] = commit.task,
                None => state.tasks.push(commit.task),
            }
            state.commits += 1;
            (progress, state.pause_after_commit.take())
        };

        if let Some(pause) = pause {
            pause.reached.notify_one();
            pause.resume.notified().await;
        }
        Ok(stored)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.state.lock().unwrap().progress.remove(user_id);
        Ok(())
    }
}
