//! Task service - CRUD with completion changes routed through progression

use std::sync::Arc;

use questlog_common::Clock;
use questlog_domain::{
    NewTask, ProgressionSnapshot, QuestlogError, Result, Task, TaskFilter, TaskPatch,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ports::{CalendarSync, TaskRepository};
use crate::progression::ProgressionService;

/// Calendar sync failure reported alongside a successful task change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncWarning {
    pub message: String,
}

impl From<QuestlogError> for SyncWarning {
    fn from(err: QuestlogError) -> Self {
        Self { message: err.to_string() }
    }
}

/// Result of creating, updating or deleting a task
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdateOutcome {
    pub task: Task,
    /// Present when the change toggled completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progression: Option<ProgressionSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_warning: Option<SyncWarning>,
}

/// Task service
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    progression: Arc<ProgressionService>,
    clock: Arc<dyn Clock>,
    calendar: Option<Arc<dyn CalendarSync>>,
}

impl TaskService {
    /// Create a new task service
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        progression: Arc<ProgressionService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { tasks, progression, clock, calendar: None }
    }

    /// Mirror scheduled tasks into an external calendar.
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSync>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn progression(&self) -> &ProgressionService {
        &self.progression
    }

    /// Create a pending task owned by `user_id`.
    ///
    /// # Errors
    /// `Validation` for malformed input, or a store failure.
    pub async fn create_task(&self, user_id: &str, input: NewTask) -> Result<TaskUpdateOutcome> {
        let task = Task::create(user_id, input, self.clock.now())?;
        self.tasks.save_task(&task).await?;
        info!(user_id, task_id = %task.id, "Created task");

        let (task, sync_warning) = self.sync_calendar(user_id, task).await;
        Ok(TaskUpdateOutcome { task, progression: None, sync_warning })
    }

    /// # Errors
    /// `NotFound` when the task does not exist or belongs to someone else.
    pub async fn get_task(&self, user_id: &str, task_id: &str) -> Result<Task> {
        self.load_owned(user_id, task_id).await
    }

    /// # Errors
    /// Store failures only.
    pub async fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        self.tasks.list_tasks(user_id, filter).await
    }

    /// Apply a partial update.
    ///
    /// Field changes are saved first, then a change of `completed` goes
    /// through the progression engine, so XP is priced from the updated
    /// fields. Calendar sync runs last and cannot fail the update.
    ///
    /// # Errors
    /// `NotFound`, `Validation`, or any progression/store failure. A failed
    /// progression change leaves the task's completion state untouched.
    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<TaskUpdateOutcome> {
        let mut task = self.load_owned(user_id, task_id).await?;

        if patch.has_field_changes() {
            let locks = self.progression.locks();
            let _guard = locks.acquire(user_id).await;

            task = self.load_owned(user_id, task_id).await?;
            patch.apply_fields(&mut task, self.clock.now());
            task.validate()?;
            self.tasks.save_task(&task).await?;
            debug!(user_id, task_id, "Saved task field changes");
        }

        let progression = match patch.completed {
            Some(true) if !task.completed => {
                Some(self.progression.grant_completion(user_id, task_id).await?)
            }
            Some(false) if task.completed => {
                Some(self.progression.revert_completion(user_id, task_id).await?)
            }
            _ => None,
        };
        if progression.is_some() {
            task = self.load_owned(user_id, task_id).await?;
        }

        let (task, sync_warning) = self.sync_calendar(user_id, task).await;
        Ok(TaskUpdateOutcome { task, progression, sync_warning })
    }

    /// Delete a task, reverting its XP first when it is completed.
    ///
    /// The revert and the removal happen under one hold of the user's lock,
    /// so no completion can be granted in between.
    ///
    /// # Errors
    /// `NotFound`, or any progression/store failure. The task is kept when
    /// reverting its XP fails.
    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<TaskUpdateOutcome> {
        let locks = self.progression.locks();
        let guard = locks.acquire(user_id).await;

        let task = self.load_owned(user_id, task_id).await?;
        let progression = if task.completed {
            Some(self.progression.revert_completion_locked(user_id, task_id).await?)
        } else {
            None
        };
        if !self.tasks.delete_task(task_id).await? {
            return Err(QuestlogError::NotFound(format!("task {task_id}")));
        }
        drop(guard);
        info!(user_id, task_id, "Deleted task");

        let sync_warning = match (&self.calendar, task.google_event_id.as_deref()) {
            (Some(calendar), Some(event_id)) => match calendar.remove_event(event_id).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(user_id, task_id, event_id, error = %err, "Calendar event removal failed");
                    Some(SyncWarning::from(err))
                }
            },
            _ => None,
        };

        Ok(TaskUpdateOutcome { task, progression, sync_warning })
    }

    async fn load_owned(&self, user_id: &str, task_id: &str) -> Result<Task> {
        match self.tasks.find_task(task_id).await? {
            Some(task) if task.is_owned_by(user_id) => Ok(task),
            _ => Err(QuestlogError::NotFound(format!("task {task_id}"))),
        }
    }

    /// Push a scheduled task to the calendar and remember its event id.
    /// A task whose schedule was cleared loses its event.
    ///
    /// Failures are logged and returned as a warning, never as an error.
    async fn sync_calendar(&self, user_id: &str, task: Task) -> (Task, Option<SyncWarning>) {
        let Some(calendar) = &self.calendar else {
            return (task, None);
        };
        if task.start_time.is_none() {
            let Some(event_id) = task.google_event_id.clone() else {
                return (task, None);
            };
            if let Err(err) = calendar.remove_event(&event_id).await {
                warn!(user_id, task_id = %task.id, event_id = %event_id, error = %err, "Calendar event removal failed");
                return (task, Some(SyncWarning::from(err)));
            }
            return self.store_event_id(user_id, task, None).await;
        }

        let event_id = match calendar.sync_event(&task).await {
            Ok(event_id) => event_id,
            Err(err) => {
                warn!(user_id, task_id = %task.id, error = %err, "Calendar sync failed");
                return (task, Some(SyncWarning::from(err)));
            }
        };
        if task.google_event_id.as_deref() == Some(event_id.as_str()) {
            return (task, None);
        }

        self.store_event_id(user_id, task, Some(event_id)).await
    }

    async fn store_event_id(
        &self,
        user_id: &str,
        task: Task,
        event_id: Option<String>,
    ) -> (Task, Option<SyncWarning>) {
        match self.set_event_id(user_id, &task.id, event_id).await {
            Ok(updated) => (updated, None),
            Err(err) => {
                warn!(user_id, task_id = %task.id, error = %err, "Failed to store calendar event id");
                (task, Some(SyncWarning::from(err)))
            }
        }
    }

    async fn set_event_id(
        &self,
        user_id: &str,
        task_id: &str,
        event_id: Option<String>,
    ) -> Result<Task> {
        let locks = self.progression.locks();
        let _guard = locks.acquire(user_id).await;

        let mut task = self.load_owned(user_id, task_id).await?;
        task.google_event_id = event_id;
        self.tasks.save_task(&task).await?;
        Ok(task)
    }
}
