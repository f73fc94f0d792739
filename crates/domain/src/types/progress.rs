//! Progression records
//!
//! One [`UserProgress`] per user, mutated only by the progression engine.
//! Achievements are embedded and unique by id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Milestone family an achievement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Level,
    Streak,
    DailyWarrior,
    WeeklyStreak,
}

impl_domain_enum_conversions!(AchievementKind {
    Level => "level",
    Streak => "streak",
    DailyWarrior => "daily_warrior",
    WeeklyStreak => "weekly_streak",
});

/// A one-time milestone unlock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique per user, e.g. `level-5`, `streak-7`, `daily-warrior`.
    pub id: String,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Persistent progression state of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub xp: u64,
    /// Always `xp / 100 + 1`; never written independently of `xp`.
    pub level: u32,
    pub streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub achievements: Vec<Achievement>,
    /// Optimistic-concurrency token, bumped by every committed write.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    /// Fresh level-1 progress for a user without history.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            xp: 0,
            level: 1,
            streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            achievements: Vec::new(),
            version: 0,
            updated_at: now,
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    pub fn achievement_ids(&self) -> impl Iterator<Item = &str> {
        self.achievements.iter().map(|a| a.id.as_str())
    }
}

/// Consistent view of a user's progression returned after each operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    pub progress_within_level: u64,
    pub xp_to_next_level: u64,
    pub streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub achievements: Vec<Achievement>,
    /// Achievements unlocked by the operation that produced this snapshot.
    pub newly_unlocked: Vec<Achievement>,
    /// Signed XP change applied by that operation.
    pub xp_delta: i64,
}
