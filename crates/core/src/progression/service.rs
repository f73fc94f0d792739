//! Progression orchestrator
//!
//! Applies task completion changes to a user's progress: XP, level, streak
//! and achievements move together in one atomic commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use questlog_common::Clock;
use questlog_domain::{
    ProgressionConfig, ProgressionSnapshot, QuestlogError, Result, Task, UserProgress, XpFormula,
};
use tracing::{debug, info, warn};

use super::achievements::{evaluate, revoke_levels_above, ProgressTransition};
use super::locks::UserLockRegistry;
use super::ports::{ProgressCommit, ProgressRepository};
use super::streak::{completion_days, completions_on, StreakTracker};
use super::xp::{level_for_xp, progress_within_level, revert_xp, xp_for_task, xp_to_next_level};
use crate::tasks::ports::TaskRepository;

/// Tunables of the progression engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionSettings {
    pub xp_formula: XpFormula,
    pub streak_grace_days: u32,
    pub max_conflict_retries: u32,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self::from(&ProgressionConfig::default())
    }
}

impl From<&ProgressionConfig> for ProgressionSettings {
    fn from(config: &ProgressionConfig) -> Self {
        Self {
            xp_formula: config.xp_formula,
            streak_grace_days: config.streak_grace_days,
            max_conflict_retries: config.max_conflict_retries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Grant,
    Revert,
}

impl Transition {
    fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revert => "revert",
        }
    }

    /// Completion state the task ends up in.
    fn target_completed(self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Progression orchestrator
pub struct ProgressionService {
    tasks: Arc<dyn TaskRepository>,
    progress: Arc<dyn ProgressRepository>,
    clock: Arc<dyn Clock>,
    locks: Arc<UserLockRegistry>,
    settings: ProgressionSettings,
    streaks: StreakTracker,
}

impl ProgressionService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        progress: Arc<dyn ProgressRepository>,
        clock: Arc<dyn Clock>,
        settings: ProgressionSettings,
    ) -> Self {
        Self {
            tasks,
            progress,
            clock,
            locks: Arc::new(UserLockRegistry::new()),
            streaks: StreakTracker::new(settings.streak_grace_days),
            settings,
        }
    }

    /// Share an existing lock registry, so other writers of the same users
    /// serialize with this service.
    pub fn with_locks(mut self, locks: Arc<UserLockRegistry>) -> Self {
        self.locks = locks;
        self
    }

    pub fn settings(&self) -> ProgressionSettings {
        self.settings
    }

    /// Registry serializing this service's writes per user.
    pub fn locks(&self) -> Arc<UserLockRegistry> {
        Arc::clone(&self.locks)
    }

    /// Apply the pending→completed transition of `task_id`.
    ///
    /// A task that is already completed is left alone and the current
    /// snapshot is returned.
    ///
    /// # Errors
    /// `NotFound` when the task does not exist or belongs to someone else,
    /// `ConcurrencyConflict` once retries are exhausted, and any store
    /// failure. Nothing is written when an error is returned.
    pub async fn grant_completion(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<ProgressionSnapshot> {
        self.apply(user_id, task_id, Transition::Grant).await
    }

    /// Apply the completed→pending transition of `task_id`.
    ///
    /// Subtracts exactly the XP stored on the task. A task that is already
    /// pending is left alone and the current snapshot is returned.
    ///
    /// # Errors
    /// Same as [`ProgressionService::grant_completion`].
    pub async fn revert_completion(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<ProgressionSnapshot> {
        self.apply(user_id, task_id, Transition::Revert).await
    }

    /// Current progression of `user_id`, with the streak evaluated as of today.
    ///
    /// # Errors
    /// Any store failure.
    pub async fn snapshot(&self, user_id: &str) -> Result<ProgressionSnapshot> {
        let progress = self.progress.get_or_create(user_id, self.clock.now()).await?;
        let history = self.tasks.completion_history(user_id).await?;
        let days = completion_days(history.iter().map(|record| record.completed_at));

        let mut view = progress;
        view.streak = self.streaks.current_streak(&days, self.clock.today(), false);
        Ok(snapshot_of(&view, Vec::new(), 0))
    }

    /// [`ProgressionService::revert_completion`] for a caller that already
    /// holds `user_id`'s guard from [`ProgressionService::locks`].
    pub(crate) async fn revert_completion_locked(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<ProgressionSnapshot> {
        self.apply_locked(user_id, task_id, Transition::Revert).await
    }

    async fn apply(
        &self,
        user_id: &str,
        task_id: &str,
        transition: Transition,
    ) -> Result<ProgressionSnapshot> {
        let _guard = self.locks.acquire(user_id).await;
        self.apply_locked(user_id, task_id, transition).await
    }

    async fn apply_locked(
        &self,
        user_id: &str,
        task_id: &str,
        transition: Transition,
    ) -> Result<ProgressionSnapshot> {
        let mut attempt = 0_u32;
        loop {
            let task = self.load_owned_task(user_id, task_id).await?;
            if task.completed == transition.target_completed() {
                debug!(
                    user_id,
                    task_id,
                    transition = transition.as_str(),
                    "Task already in target state, nothing to apply"
                );
                return self.snapshot(user_id).await;
            }

            let result = match transition {
                Transition::Grant => self.try_grant(user_id, task).await,
                Transition::Revert => self.try_revert(user_id, task).await,
            };

            match result {
                Err(err) if err.is_retryable() && attempt < self.settings.max_conflict_retries => {
                    attempt += 1;
                    warn!(
                        user_id,
                        task_id,
                        attempt,
                        transition = transition.as_str(),
                        error = %err,
                        "Progress changed concurrently, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    async fn load_owned_task(&self, user_id: &str, task_id: &str) -> Result<Task> {
        match self.tasks.find_task(task_id).await? {
            Some(task) if task.is_owned_by(user_id) => Ok(task),
            _ => Err(QuestlogError::NotFound(format!("task {task_id}"))),
        }
    }

    async fn try_grant(&self, user_id: &str, mut task: Task) -> Result<ProgressionSnapshot> {
        let now = self.clock.now();
        let today = now.date_naive();

        let current = self.progress.get_or_create(user_id, now).await?;
        let mut completions: Vec<DateTime<Utc>> = self
            .tasks
            .completion_history(user_id)
            .await?
            .into_iter()
            .filter(|record| record.task_id != task.id)
            .map(|record| record.completed_at)
            .collect();
        completions.push(now);
        let days = completion_days(completions.iter().copied());

        let granted = xp_for_task(self.settings.xp_formula, &task);
        let xp = current.xp.saturating_add(granted);
        let level = level_for_xp(xp);
        let streak = self.streaks.current_streak(&days, today, true);

        let unlocked = evaluate(
            &current.achievements,
            &ProgressTransition {
                old_level: current.level,
                new_level: level,
                old_streak: current.streak,
                new_streak: streak,
                completions_today: completions_on(&completions, today),
                days: &days,
                today,
            },
            now,
        );

        let mut next = current.clone();
        next.xp = xp;
        next.level = level;
        next.streak = streak;
        next.longest_streak = next.longest_streak.max(streak);
        next.last_activity_date = Some(today);
        next.achievements.extend(unlocked.iter().cloned());
        next.updated_at = now;

        task.mark_completed(now, granted);
        let task_id = task.id.clone();

        let stored = self
            .progress
            .commit(ProgressCommit { progress: next, expected_version: current.version, task })
            .await?;

        let delta = xp_delta(current.xp, stored.xp);
        info!(
            user_id,
            task_id = %task_id,
            xp_delta = delta,
            xp = stored.xp,
            level = stored.level,
            streak = stored.streak,
            unlocked = unlocked.len(),
            "Granted task completion"
        );
        Ok(snapshot_of(&stored, unlocked, delta))
    }

    async fn try_revert(&self, user_id: &str, mut task: Task) -> Result<ProgressionSnapshot> {
        let now = self.clock.now();
        let today = now.date_naive();

        let current = self.progress.get_or_create(user_id, now).await?;
        let remaining: Vec<DateTime<Utc>> = self
            .tasks
            .completion_history(user_id)
            .await?
            .into_iter()
            .filter(|record| record.task_id != task.id)
            .map(|record| record.completed_at)
            .collect();
        let days = completion_days(remaining.iter().copied());

        let xp = revert_xp(current.xp, task.xp_value);
        let level = level_for_xp(xp);

        let mut next = current.clone();
        next.xp = xp;
        next.level = level;
        next.streak = self.streaks.current_streak(&days, today, false);
        next.last_activity_date = days.range(..=today).next_back().copied();
        let revoked = revoke_levels_above(&mut next.achievements, level);
        next.updated_at = now;

        task.mark_pending(now);
        let task_id = task.id.clone();

        let stored = self
            .progress
            .commit(ProgressCommit { progress: next, expected_version: current.version, task })
            .await?;

        let delta = xp_delta(current.xp, stored.xp);
        info!(
            user_id,
            task_id = %task_id,
            xp_delta = delta,
            xp = stored.xp,
            level = stored.level,
            streak = stored.streak,
            revoked = revoked.len(),
            "Reverted task completion"
        );
        Ok(snapshot_of(&stored, Vec::new(), delta))
    }
}

fn xp_delta(before: u64, after: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map_or(i64::MIN, |diff| -diff)
    }
}

fn snapshot_of(
    progress: &UserProgress,
    newly_unlocked: Vec<questlog_domain::Achievement>,
    xp_delta: i64,
) -> ProgressionSnapshot {
    ProgressionSnapshot {
        user_id: progress.user_id.clone(),
        xp: progress.xp,
        level: progress.level,
        progress_within_level: progress_within_level(progress.xp),
        xp_to_next_level: xp_to_next_level(progress.xp),
        streak: progress.streak,
        longest_streak: progress.longest_streak,
        last_activity_date: progress.last_activity_date,
        achievements: progress.achievements.clone(),
        newly_unlocked,
        xp_delta,
    }
}
