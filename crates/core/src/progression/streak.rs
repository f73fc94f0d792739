//! Streak tracker
//!
//! Streaks are re-derived from the full set of completion days on every
//! XP-affecting event. Days are UTC calendar dates.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

/// Distinct UTC calendar days on which something was completed.
pub fn completion_days<I>(completions: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    completions.into_iter().map(|at| at.date_naive()).collect()
}

/// Number of completions that fall on `day`.
pub fn completions_on<'a, I>(completions: I, day: NaiveDate) -> usize
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    completions.into_iter().filter(|at| at.date_naive() == day).count()
}

/// Whether every one of the `span` days ending at `today` has a completion.
pub fn covers_trailing_days(days: &BTreeSet<NaiveDate>, today: NaiveDate, span: u32) -> bool {
    if span == 0 {
        return true;
    }
    (0..span).all(|offset| {
        today
            .checked_sub_days(Days::new(u64::from(offset)))
            .is_some_and(|day| days.contains(&day))
    })
}

/// Length of the run of consecutive days ending at `last`.
fn run_ending_at(days: &BTreeSet<NaiveDate>, last: NaiveDate) -> u32 {
    let mut count = 0_u32;
    let mut expected = last;
    for day in days.range(..=last).rev() {
        if *day != expected {
            break;
        }
        count = count.saturating_add(1);
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    count
}

/// Longest run of consecutive days anywhere in `days`.
pub fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0_u32;
    let mut current = 0_u32;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous.and_then(|day| day.succ_opt()) {
            Some(next) if next == *day => current.saturating_add(1),
            _ => 1,
        };
        best = best.max(current);
        previous = Some(*day);
    }
    best
}

/// Computes the current streak from completion days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakTracker {
    grace_days: u32,
}

impl StreakTracker {
    /// `grace_days` is how long after its last day a streak stays alive.
    /// With `0`, only a completion today keeps it.
    pub fn new(grace_days: u32) -> Self {
        Self { grace_days }
    }

    pub fn grace_days(&self) -> u32 {
        self.grace_days
    }

    /// Current streak as of `today`.
    ///
    /// When `credit_today` is set (the evaluation is caused by a completion
    /// happening today) today counts even if `days` does not contain it yet.
    /// Days after `today` are ignored.
    pub fn current_streak(
        &self,
        days: &BTreeSet<NaiveDate>,
        today: NaiveDate,
        credit_today: bool,
    ) -> u32 {
        let last = if credit_today || days.contains(&today) {
            today
        } else {
            match days.range(..today).next_back() {
                Some(day) => *day,
                None => return 0,
            }
        };

        let gap = (today - last).num_days();
        if gap > i64::from(self.grace_days) {
            return 0;
        }

        if credit_today && !days.contains(&today) {
            let mut with_today = days.clone();
            with_today.insert(today);
            return run_ending_at(&with_today, today);
        }
        run_ending_at(days, last)
    }
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new(questlog_domain::constants::DEFAULT_STREAK_GRACE_DAYS)
    }
}
