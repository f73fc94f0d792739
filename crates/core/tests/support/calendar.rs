use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use questlog_core::CalendarSync;
use questlog_domain::{QuestlogError, Result, Task};

/// Calendar mock that records calls and can be switched to failing.
#[derive(Clone, Default)]
pub struct RecordingCalendar {
    synced: Arc<Mutex<Vec<String>>>,
    removed: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let calendar = Self::default();
        calendar.set_failing(true);
        calendar
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Task ids passed to `sync_event`, in call order.
    pub fn synced(&self) -> Vec<String> {
        self.synced.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSync for RecordingCalendar {
    async fn sync_event(&self, task: &Task) -> Result<String> {
        if *self.failing.lock().unwrap() {
            return Err(QuestlogError::SyncFailure("calendar returned 503".into()));
        }
        self.synced.lock().unwrap().push(task.id.clone());
        Ok(format!("evt-{}", task.id))
    }

    async fn remove_event(&self, event_id: &str) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(QuestlogError::SyncFailure("calendar returned 503".into()));
        }
        self.removed.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}
