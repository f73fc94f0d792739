//! SQLite-backed implementation of the `TaskRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use questlog_core::{CompletionRecord, TaskRepository};
use questlog_domain::{Result, Task, TaskFilter};
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::rows::{from_millis, map_task_row, upsert_task, TASK_COLUMNS};
use crate::errors::to_domain;

/// SQLite-backed task repository.
pub struct SqliteTaskRepository {
    db: Arc<DbManager>,
}

impl SqliteTaskRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>> {
        let db = Arc::clone(&self.db);
        let task_id = task_id.to_owned();

        task::spawn_blocking(move || -> Result<Option<Task>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![task_id],
                map_task_row,
            )
            .optional()
            .map_err(to_domain)
        })
        .await
        .map_err(to_domain)?
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        let db = Arc::clone(&self.db);
        let task = task.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            upsert_task(&conn, &task)
        })
        .await
        .map_err(to_domain)?
    }

    async fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();

        task::spawn_blocking(move || -> Result<Vec<Task>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE user_id = ?1 AND (?2 IS NULL OR completed = ?2)
                     ORDER BY created_at ASC, id ASC"
                ))
                .map_err(to_domain)?;
            let rows = stmt
                .query_map(params![user_id, filter.completed], map_task_row)
                .map_err(to_domain)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(to_domain)
        })
        .await
        .map_err(to_domain)?
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let task_id = task_id.to_owned();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
                .map_err(to_domain)?;
            Ok(deleted > 0)
        })
        .await
        .map_err(to_domain)?
    }

    async fn completion_history(&self, user_id: &str) -> Result<Vec<CompletionRecord>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();

        task::spawn_blocking(move || -> Result<Vec<CompletionRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, completed_at FROM tasks
                     WHERE user_id = ?1 AND completed = 1
                     ORDER BY completed_at ASC",
                )
                .map_err(to_domain)?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok(CompletionRecord {
                        task_id: row.get(0)?,
                        completed_at: from_millis(1, row.get(1)?)?,
                    })
                })
                .map_err(to_domain)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(to_domain)
        })
        .await
        .map_err(to_domain)?
    }
}
