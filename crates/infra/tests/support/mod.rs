//! Shared helpers for `questlog-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use questlog_common::{Clock, MockClock};
use questlog_core::{ProgressionService, ProgressionSettings, TaskRepository, TaskService};
use questlog_domain::{NewTask, Priority, Task};
use questlog_infra::{DbManager, SqliteProgressRepository, SqliteTaskRepository};
use tempfile::TempDir;

/// Monday 2025-03-10, 09:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

/// Temporary migrated database that lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager =
            DbManager::open(temp_dir.path().join("questlog.db"), 4).expect("database should open");
        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn tasks(&self) -> Arc<SqliteTaskRepository> {
        Arc::new(SqliteTaskRepository::new(Arc::clone(&self.manager)))
    }

    pub fn progress(&self) -> Arc<SqliteProgressRepository> {
        Arc::new(SqliteProgressRepository::new(Arc::clone(&self.manager)))
    }
}

/// Services wired over a fresh SQLite database and a mock clock.
pub struct SqliteHarness {
    pub db: TestDatabase,
    pub clock: MockClock,
    pub progression: Arc<ProgressionService>,
    pub tasks: TaskService,
}

impl SqliteHarness {
    pub fn new() -> Self {
        let db = TestDatabase::new();
        let clock = MockClock::at(start());
        let progression = Arc::new(ProgressionService::new(
            db.tasks(),
            db.progress(),
            Arc::new(clock.clone()),
            ProgressionSettings::default(),
        ));
        let tasks = TaskService::new(db.tasks(), Arc::clone(&progression), Arc::new(clock.clone()));
        Self { db, clock, progression, tasks }
    }

    /// Store a pending task directly.
    pub async fn add_task(&self, user_id: &str, priority: Priority, duration_minutes: u32) -> Task {
        let input = NewTask {
            title: format!("{priority} task"),
            priority,
            duration_minutes,
            ..NewTask::default()
        };
        let task = Task::create(user_id, input, self.clock.now()).unwrap();
        self.db.tasks().save_task(&task).await.unwrap();
        task
    }
}
