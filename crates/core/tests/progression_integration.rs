//! Integration tests for the progression orchestrator
//!
//! Runs grant/revert flows against in-memory stores and a mock clock.

mod support;

use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use questlog_core::progression::xp::level_for_xp;
use questlog_core::{ProgressionService, ProgressionSettings};
use questlog_domain::{Priority, QuestlogError, UserProgress, XpFormula};
use support::{start, Harness};

const USER: &str = "user-1";

fn progress_with_xp(xp: u64) -> UserProgress {
    UserProgress { xp, level: level_for_xp(xp), ..UserProgress::new(USER, start()) }
}

fn ids(achievements: &[questlog_domain::Achievement]) -> Vec<&str> {
    achievements.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn grant_then_revert_restores_xp() {
    let h = Harness::new();
    h.store.seed_progress(progress_with_xp(40));
    let task = h.add_task(USER, Priority::High, 60);

    let granted = h.progression.grant_completion(USER, &task.id).await.unwrap();
    assert_eq!(granted.xp, 72);
    assert_eq!(granted.xp_delta, 32);
    assert_eq!(h.store.task(&task.id).unwrap().xp_value, 32);

    let reverted = h.progression.revert_completion(USER, &task.id).await.unwrap();
    assert_eq!(reverted.xp, 40);
    assert_eq!(reverted.xp_delta, -32);

    let stored = h.store.task(&task.id).unwrap();
    assert!(!stored.completed);
    assert_eq!(stored.completed_at, None);
    assert_eq!(stored.xp_value, 0);
}

#[tokio::test]
async fn crossing_a_level_boundary_unlocks_that_level() {
    let h = Harness::new();
    h.store.seed_progress(progress_with_xp(95));
    let task = h.add_task(USER, Priority::High, 60);

    let snapshot = h.progression.grant_completion(USER, &task.id).await.unwrap();

    assert_eq!(snapshot.xp, 127);
    assert_eq!(snapshot.level, 2);
    assert_eq!(snapshot.progress_within_level, 27);
    assert_eq!(snapshot.xp_to_next_level, 73);
    assert!(ids(&snapshot.newly_unlocked).contains(&"level-2"));
    assert!(ids(&snapshot.achievements).contains(&"level-2"));
}

#[tokio::test]
async fn revert_below_zero_clamps() {
    let h = Harness::new();
    h.store.seed_progress(progress_with_xp(20));
    let mut task = h.add_task(USER, Priority::High, 60);
    task.mark_completed(start(), 32);
    h.store.seed_task(task.clone());

    let snapshot = h.progression.revert_completion(USER, &task.id).await.unwrap();

    assert_eq!(snapshot.xp, 0);
    assert_eq!(snapshot.level, 1);
    assert_eq!(snapshot.xp_delta, -20);
}

#[tokio::test]
async fn level_down_revokes_only_level_achievements() {
    let h = Harness::new();
    h.store.seed_progress(progress_with_xp(95));
    let task = h.add_task(USER, Priority::High, 60);

    h.progression.grant_completion(USER, &task.id).await.unwrap();
    let snapshot = h.progression.revert_completion(USER, &task.id).await.unwrap();

    assert_eq!(snapshot.xp, 95);
    assert_eq!(snapshot.level, 1);
    assert!(!ids(&snapshot.achievements).contains(&"level-2"));
}

#[tokio::test]
async fn level_stays_derived_from_xp() {
    let h = Harness::new();
    let tasks: Vec<_> = (0..8).map(|_| h.add_task(USER, Priority::High, 90)).collect();

    for task in &tasks {
        let snapshot = h.progression.grant_completion(USER, &task.id).await.unwrap();
        assert_eq!(snapshot.level, level_for_xp(snapshot.xp));
        h.clock.advance(Duration::minutes(10));
    }
    for task in tasks.iter().rev() {
        let snapshot = h.progression.revert_completion(USER, &task.id).await.unwrap();
        assert_eq!(snapshot.level, level_for_xp(snapshot.xp));
    }

    let progress = h.store.progress_of(USER).unwrap();
    assert_eq!(progress.xp, 0);
    assert_eq!(progress.level, 1);
}

#[tokio::test]
async fn daily_warrior_unlocks_once() {
    let h = Harness::new();
    let tasks: Vec<_> = (0..6).map(|_| h.add_task(USER, Priority::Low, 0)).collect();

    let mut unlocked_at = Vec::new();
    for (n, task) in tasks.iter().enumerate() {
        let snapshot = h.progression.grant_completion(USER, &task.id).await.unwrap();
        if ids(&snapshot.newly_unlocked).contains(&"daily-warrior") {
            unlocked_at.push(n + 1);
        }
        h.clock.advance(Duration::minutes(30));
    }

    assert_eq!(unlocked_at, vec![5]);
    let progress = h.store.progress_of(USER).unwrap();
    assert_eq!(progress.achievement_ids().filter(|id| *id == "daily-warrior").count(), 1);
}

#[tokio::test]
async fn consecutive_days_build_a_streak() {
    let h = Harness::new();
    let mut last = None;
    for _ in 0..3 {
        let task = h.add_task(USER, Priority::Medium, 30);
        last = Some(h.progression.grant_completion(USER, &task.id).await.unwrap());
        h.clock.advance(Duration::days(1));
    }

    let snapshot = last.unwrap();
    assert_eq!(snapshot.streak, 3);
    assert_eq!(snapshot.longest_streak, 3);
}

#[tokio::test]
async fn skipped_day_resets_the_streak() {
    let h = Harness::new();
    let first = h.add_task(USER, Priority::Medium, 30);
    h.progression.grant_completion(USER, &first.id).await.unwrap();

    h.clock.advance(Duration::days(2));
    let second = h.add_task(USER, Priority::Medium, 30);
    let snapshot = h.progression.grant_completion(USER, &second.id).await.unwrap();

    assert_eq!(snapshot.streak, 1);
}

#[tokio::test]
async fn seventh_day_unlocks_streak_milestone_once() {
    let h = Harness::new();
    for _ in 0..6 {
        let task = h.add_task(USER, Priority::Low, 0);
        h.progression.grant_completion(USER, &task.id).await.unwrap();
        h.clock.advance(Duration::days(1));
    }
    assert_eq!(h.store.progress_of(USER).unwrap().streak, 6);

    let seventh = h.add_task(USER, Priority::Low, 0);
    let snapshot = h.progression.grant_completion(USER, &seventh.id).await.unwrap();
    assert_eq!(snapshot.streak, 7);
    assert!(ids(&snapshot.newly_unlocked).contains(&"streak-7"));
    assert!(ids(&snapshot.newly_unlocked).contains(&"weekly-streak"));

    h.clock.advance(Duration::hours(1));
    let extra = h.add_task(USER, Priority::Low, 0);
    let again = h.progression.grant_completion(USER, &extra.id).await.unwrap();
    assert!(again.newly_unlocked.is_empty());
    assert_eq!(ids(&again.achievements).iter().filter(|id| **id == "streak-7").count(), 1);
}

#[tokio::test]
async fn reverting_todays_only_completion_recomputes_from_history() {
    let h = Harness::new();
    let yesterday = h.add_task(USER, Priority::Medium, 30);
    h.progression.grant_completion(USER, &yesterday.id).await.unwrap();
    h.clock.advance(Duration::days(1));
    let today = h.add_task(USER, Priority::Medium, 30);
    let granted = h.progression.grant_completion(USER, &today.id).await.unwrap();
    assert_eq!(granted.streak, 2);

    let snapshot = h.progression.revert_completion(USER, &today.id).await.unwrap();

    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.last_activity_date, Some(start().date_naive()));
    assert_eq!(snapshot.longest_streak, 2);
    assert_eq!(h.progression.snapshot(USER).await.unwrap().streak, 0);
}

#[tokio::test]
async fn grace_window_keeps_yesterdays_streak_when_enabled() {
    let settings = ProgressionSettings { streak_grace_days: 1, ..ProgressionSettings::default() };
    let h = Harness::with_settings(settings);
    let yesterday = h.add_task(USER, Priority::Medium, 30);
    h.progression.grant_completion(USER, &yesterday.id).await.unwrap();
    h.clock.advance(Duration::days(1));
    let today = h.add_task(USER, Priority::Medium, 30);
    h.progression.grant_completion(USER, &today.id).await.unwrap();

    let snapshot = h.progression.revert_completion(USER, &today.id).await.unwrap();

    assert_eq!(snapshot.streak, 1);
}

#[tokio::test]
async fn toggling_to_current_state_is_a_no_op() {
    let h = Harness::new();
    let task = h.add_task(USER, Priority::High, 60);

    let first = h.progression.grant_completion(USER, &task.id).await.unwrap();
    let second = h.progression.grant_completion(USER, &task.id).await.unwrap();

    assert_eq!(second.xp, first.xp);
    assert_eq!(second.xp_delta, 0);
    assert!(second.newly_unlocked.is_empty());
    assert_eq!(h.store.commit_count(), 1);

    let pending = h.add_task(USER, Priority::Low, 30);
    let untouched = h.progression.revert_completion(USER, &pending.id).await.unwrap();
    assert_eq!(untouched.xp, first.xp);
    assert_eq!(h.store.commit_count(), 1);
}

#[tokio::test]
async fn conflicts_are_retried() {
    let h = Harness::new();
    let task = h.add_task(USER, Priority::High, 60);
    h.store.inject_conflicts(2);

    let snapshot = h.progression.grant_completion(USER, &task.id).await.unwrap();

    assert_eq!(snapshot.xp, 32);
    assert_eq!(h.store.commit_count(), 1);
    assert_eq!(h.store.rejected_commit_count(), 2);
}

#[tokio::test]
async fn conflicts_surface_after_retry_budget() {
    let h = Harness::new();
    let task = h.add_task(USER, Priority::High, 60);
    h.store.inject_conflicts(10);

    let err = h.progression.grant_completion(USER, &task.id).await.unwrap_err();

    assert!(matches!(err, QuestlogError::ConcurrencyConflict(_)));
    // one attempt plus the default three retries
    assert_eq!(h.store.rejected_commit_count(), 4);
    assert!(!h.store.task(&task.id).unwrap().completed);
    assert_eq!(h.store.progress_of(USER).unwrap().xp, 0);
}

#[tokio::test]
async fn persistence_failure_commits_nothing() {
    let h = Harness::new();
    let task = h.add_task(USER, Priority::High, 60);
    h.store.fail_commits(true);

    let err = h.progression.grant_completion(USER, &task.id).await.unwrap_err();
    assert!(matches!(err, QuestlogError::Persistence(_)));
    assert_eq!(h.store.rejected_commit_count(), 1, "persistence errors are not retried");

    let stored = h.store.task(&task.id).unwrap();
    assert!(!stored.completed);
    assert_eq!(stored.xp_value, 0);
    let progress = h.store.progress_of(USER).unwrap();
    assert_eq!((progress.xp, progress.streak, progress.version), (0, 0, 0));

    h.store.fail_commits(false);
    let snapshot = h.progression.grant_completion(USER, &task.id).await.unwrap();
    assert_eq!(snapshot.xp, 32);
}

#[tokio::test]
async fn tasks_of_other_users_are_not_found() {
    let h = Harness::new();
    let task = h.add_task("someone-else", Priority::High, 60);

    let err = h.progression.grant_completion(USER, &task.id).await.unwrap_err();
    assert!(matches!(err, QuestlogError::NotFound(_)));

    let err = h.progression.grant_completion(USER, "missing").await.unwrap_err();
    assert!(matches!(err, QuestlogError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_grants_lose_no_xp() {
    let h = Harness::new();
    let tasks: Vec<_> = (0..20).map(|_| h.add_task(USER, Priority::High, 60)).collect();
    let service: Arc<ProgressionService> = Arc::clone(&h.progression);

    let results = join_all(tasks.iter().map(|task| {
        let service = Arc::clone(&service);
        let task_id = task.id.clone();
        async move { service.grant_completion(USER, &task_id).await }
    }))
    .await;

    assert!(results.iter().all(Result::is_ok));
    let progress = h.store.progress_of(USER).unwrap();
    assert_eq!(progress.xp, 20 * 32);
    assert_eq!(progress.level, level_for_xp(20 * 32));
    assert_eq!(h.store.commit_count(), 20);
    assert_eq!(h.store.rejected_commit_count(), 0);
}

#[tokio::test]
async fn concurrent_users_progress_independently() {
    let h = Harness::new();
    let a = h.add_task("user-a", Priority::High, 60);
    let b = h.add_task("user-b", Priority::Low, 30);

    let (ra, rb) = tokio::join!(
        h.progression.grant_completion("user-a", &a.id),
        h.progression.grant_completion("user-b", &b.id),
    );

    assert_eq!(ra.unwrap().xp, 32);
    assert_eq!(rb.unwrap().xp, 11);
}

#[tokio::test]
async fn category_formula_is_selectable() {
    let settings =
        ProgressionSettings { xp_formula: XpFormula::CategoryDuration, ..ProgressionSettings::default() };
    let h = Harness::with_settings(settings);
    let task = h.add_task(USER, Priority::High, 60);

    let granted = h.progression.grant_completion(USER, &task.id).await.unwrap();
    assert_eq!(granted.xp, 30);

    let reverted = h.progression.revert_completion(USER, &task.id).await.unwrap();
    assert_eq!(reverted.xp, 0);
}

#[tokio::test]
async fn snapshot_reports_decayed_streak() {
    let h = Harness::new();
    let task = h.add_task(USER, Priority::Medium, 30);
    h.progression.grant_completion(USER, &task.id).await.unwrap();

    h.clock.advance(Duration::days(3));
    let snapshot = h.progression.snapshot(USER).await.unwrap();

    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.longest_streak, 1);
    assert_eq!(snapshot.xp, 21);
    assert_eq!(h.store.progress_of(USER).unwrap().streak, 1);
}

#[tokio::test]
async fn first_read_stamps_progress_with_the_clock() {
    let h = Harness::new();

    h.progression.snapshot(USER).await.unwrap();

    assert_eq!(h.store.progress_of(USER).unwrap().updated_at, start());
}
