//! Shared test helpers for `questlog-core` integration tests.
//!
//! In-memory stores with failure injection plus a recording calendar, so the
//! tests can focus on progression behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod calendar;
pub mod repositories;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use questlog_common::{Clock, MockClock};
use questlog_core::{ProgressionService, ProgressionSettings, TaskService};
use questlog_domain::{NewTask, Priority, Task, TaskCategory};

pub use calendar::RecordingCalendar;
pub use repositories::{CommitPause, InMemoryStore};

/// Monday 2025-03-10, 09:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

/// Wired-up services over one in-memory store and a mock clock.
pub struct Harness {
    pub store: InMemoryStore,
    pub clock: MockClock,
    pub progression: Arc<ProgressionService>,
    pub tasks: TaskService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ProgressionSettings::default())
    }

    pub fn with_settings(settings: ProgressionSettings) -> Self {
        let store = InMemoryStore::new();
        let clock = MockClock::at(start());
        let progression = Arc::new(ProgressionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            settings,
        ));
        let tasks =
            TaskService::new(Arc::new(store.clone()), Arc::clone(&progression), Arc::new(clock.clone()));
        Self { store, clock, progression, tasks }
    }

    pub fn with_calendar(mut self, calendar: RecordingCalendar) -> Self {
        self.tasks = TaskService::new(
            Arc::new(self.store.clone()),
            Arc::clone(&self.progression),
            Arc::new(self.clock.clone()),
        )
        .with_calendar(Arc::new(calendar));
        self
    }

    /// Seed a pending task directly into the store.
    pub fn add_task(&self, user_id: &str, priority: Priority, duration_minutes: u32) -> Task {
        let task = Task::create(
            user_id,
            NewTask {
                title: format!("{priority} task"),
                priority,
                category: TaskCategory::Work,
                duration_minutes,
                ..NewTask::default()
            },
            self.clock.now(),
        )
        .unwrap();
        self.store.seed_task(task.clone());
        task
    }
}
