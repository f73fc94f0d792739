//! Task records
//!
//! A task is owned by one user and toggles between pending and completed any
//! number of times. While completed it carries the XP granted for that
//! completion so the grant can be reversed exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::constants::MAX_TITLE_LENGTH;
use crate::errors::{QuestlogError, Result};
use crate::impl_domain_enum_conversions;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl_domain_enum_conversions!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl Priority {
    /// Weight used by the priority-based XP formula.
    pub fn weight(self) -> u64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Study,
    Exercise,
    Personal,
    #[default]
    Other,
}

impl_domain_enum_conversions!(TaskCategory {
    Work => "work",
    Study => "study",
    Exercise => "exercise",
    Personal => "personal",
    Other => "other",
});

impl TaskCategory {
    /// Multiplier used by the category-based XP formula.
    pub fn xp_multiplier(self) -> f64 {
        match self {
            Self::Work => 1.5,
            Self::Study => 1.3,
            Self::Exercise => 1.4,
            Self::Personal | Self::Other => 1.0,
        }
    }
}

/// A unit of work owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// XP granted by the current completion; 0 while pending.
    pub xp_value: u64,
    pub google_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a new pending task for `user_id` from creation input.
    ///
    /// # Errors
    /// Returns [`QuestlogError::Validation`] when the input violates
    /// [`Task::validate`].
    pub fn create(user_id: &str, input: NewTask, now: DateTime<Utc>) -> Result<Self> {
        let task = Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category,
            duration_minutes: input.duration_minutes,
            priority: input.priority,
            start_time: input.start_time,
            end_time: input.end_time,
            completed: false,
            completed_at: None,
            xp_value: 0,
            google_event_id: None,
            created_at: now,
            updated_at: now,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check field-level rules and the completion invariant.
    ///
    /// # Errors
    /// Returns [`QuestlogError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(QuestlogError::Validation("task owner is required".into()));
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err(QuestlogError::Validation("title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(QuestlogError::Validation(format!(
                "title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }

        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err(QuestlogError::Validation("end time precedes start time".into()));
            }
        }

        if self.completed != self.completed_at.is_some() {
            return Err(QuestlogError::Validation(
                "completed flag and completion timestamp disagree".into(),
            ));
        }
        if !self.completed && self.xp_value != 0 {
            return Err(QuestlogError::Validation("pending task carries granted XP".into()));
        }

        Ok(())
    }

    /// Whether `user_id` owns this task.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Transition to completed, recording the XP granted.
    pub fn mark_completed(&mut self, at: DateTime<Utc>, xp_value: u64) {
        self.completed = true;
        self.completed_at = Some(at);
        self.xp_value = xp_value;
        self.updated_at = at;
    }

    /// Transition back to pending, clearing the recorded grant.
    pub fn mark_pending(&mut self, at: DateTime<Utc>) {
        self.completed = false;
        self.completed_at = None;
        self.xp_value = 0;
        self.updated_at = at;
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub duration_minutes: u32,
    pub priority: Priority,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Partial update of a task; absent fields are left untouched
///
/// `start_time` and `end_time` tell an absent field (`None`) apart from an
/// explicit `null` (`Some(None)`), which clears the value.
///
/// `completed` is not applied by [`TaskPatch::apply_fields`]: completion
/// transitions go through the progression engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<TaskCategory>,
    pub duration_minutes: Option<u32>,
    pub priority: Option<Priority>,
    #[serde(deserialize_with = "present_or_null", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(deserialize_with = "present_or_null", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

/// Deserialize a field that was present in the input, `null` included.
/// Absent fields never reach this and take the `None` default.
fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Whether any non-completion field is set.
    pub fn has_field_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.duration_minutes.is_some()
            || self.priority.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }

    /// Copy every set non-completion field onto `task`.
    pub fn apply_fields(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(duration) = self.duration_minutes {
            task.duration_minutes = duration;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(start) = self.start_time {
            task.start_time = start;
        }
        if let Some(end) = self.end_time {
            task.end_time = end;
        }
        if self.has_field_changes() {
            task.updated_at = now;
        }
    }
}

/// Listing filter for a user's tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    pub completed: Option<bool>,
}

impl TaskFilter {
    /// Whether `task` passes the filter.
    pub fn matches(&self, task: &Task) -> bool {
        self.completed.map_or(true, |completed| task.completed == completed)
    }
}
