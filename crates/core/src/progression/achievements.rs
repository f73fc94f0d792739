//! Achievement engine
//!
//! Compares the state before and after a progression change and emits the
//! milestones crossed by it. Ids already held are never emitted again.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use questlog_domain::constants::{
    DAILY_WARRIOR_ID, DAILY_WARRIOR_THRESHOLD, STREAK_MILESTONES, WEEKLY_COVERAGE_DAYS,
    WEEKLY_STREAK_ID,
};
use questlog_domain::{Achievement, AchievementKind};

use super::streak::covers_trailing_days;

/// Inputs the engine evaluates for one grant
#[derive(Debug, Clone, Copy)]
pub struct ProgressTransition<'a> {
    pub old_level: u32,
    pub new_level: u32,
    pub old_streak: u32,
    pub new_streak: u32,
    /// Completions on `today`, including the one being granted.
    pub completions_today: usize,
    /// Distinct completion days, including `today` when it is being credited.
    pub days: &'a BTreeSet<NaiveDate>,
    pub today: NaiveDate,
}

/// Id of the achievement for reaching `level`.
pub fn level_id(level: u32) -> String {
    format!("level-{level}")
}

/// Id of the achievement for a streak of `milestone` days.
pub fn streak_id(milestone: u32) -> String {
    format!("streak-{milestone}")
}

fn level_achievement(level: u32, at: DateTime<Utc>) -> Achievement {
    Achievement {
        id: level_id(level),
        kind: AchievementKind::Level,
        title: format!("Level {level}"),
        description: format!("Reached level {level}"),
        icon: "⭐".to_string(),
        unlocked_at: at,
    }
}

fn streak_achievement(milestone: u32, at: DateTime<Utc>) -> Achievement {
    let (title, icon) = match milestone {
        7 => ("Week on Fire", "🔥"),
        30 => ("Monthly Momentum", "🚀"),
        _ => ("Unstoppable", "🏆"),
    };
    Achievement {
        id: streak_id(milestone),
        kind: AchievementKind::Streak,
        title: title.to_string(),
        description: format!("Completed tasks {milestone} days in a row"),
        icon: icon.to_string(),
        unlocked_at: at,
    }
}

fn daily_warrior(at: DateTime<Utc>) -> Achievement {
    Achievement {
        id: DAILY_WARRIOR_ID.to_string(),
        kind: AchievementKind::DailyWarrior,
        title: "Daily Warrior".to_string(),
        description: format!("Completed {DAILY_WARRIOR_THRESHOLD} tasks in a single day"),
        icon: "⚔️".to_string(),
        unlocked_at: at,
    }
}

fn weekly_streak(at: DateTime<Utc>) -> Achievement {
    Achievement {
        id: WEEKLY_STREAK_ID.to_string(),
        kind: AchievementKind::WeeklyStreak,
        title: "Perfect Week".to_string(),
        description: format!("Completed a task on each of the last {WEEKLY_COVERAGE_DAYS} days"),
        icon: "📅".to_string(),
        unlocked_at: at,
    }
}

/// Achievements newly earned by `transition`, in rule order.
///
/// Rules are independent: level-ups (one per crossed level), streak
/// milestones, the daily completion count, then weekly day coverage.
/// Anything whose id is in `existing` is skipped.
pub fn evaluate(
    existing: &[Achievement],
    transition: &ProgressTransition<'_>,
    at: DateTime<Utc>,
) -> Vec<Achievement> {
    let mut held: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();
    let mut unlocked = Vec::new();
    let mut push = |achievement: Achievement| {
        if held.insert(achievement.id.clone()) {
            unlocked.push(achievement);
        }
    };

    for level in transition.old_level.saturating_add(1)..=transition.new_level {
        push(level_achievement(level, at));
    }

    for milestone in STREAK_MILESTONES {
        if transition.old_streak < milestone && milestone <= transition.new_streak {
            push(streak_achievement(milestone, at));
        }
    }

    if transition.completions_today >= DAILY_WARRIOR_THRESHOLD {
        push(daily_warrior(at));
    }

    if covers_trailing_days(transition.days, transition.today, WEEKLY_COVERAGE_DAYS) {
        push(weekly_streak(at));
    }

    unlocked
}

/// Remove `level-k` achievements with `k > level`, returning the removed ones.
///
/// Only level achievements are touched; every other kind is permanent.
pub fn revoke_levels_above(achievements: &mut Vec<Achievement>, level: u32) -> Vec<Achievement> {
    let mut revoked = Vec::new();
    achievements.retain(|achievement| {
        let above = achievement.kind == AchievementKind::Level
            && achievement
                .id
                .strip_prefix("level-")
                .and_then(|n| n.parse::<u32>().ok())
                .is_some_and(|k| k > level);
        if above {
            revoked.push(achievement.clone());
        }
        !above
    });
    revoked
}
