//! XP and level calculator
//!
//! Pure functions. Level is always derived from XP, never stored on its own.

use questlog_domain::constants::{
    CATEGORY_XP_PER_BLOCK, DURATION_BLOCK_MINUTES, PRIORITY_XP_MULTIPLIER, XP_PER_LEVEL,
};
use questlog_domain::{Task, XpFormula};

/// Level reached with `xp` total experience: `xp / 100 + 1`.
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL).map_or(u32::MAX, |level| level.saturating_add(1))
}

/// XP earned inside the current level.
pub fn progress_within_level(xp: u64) -> u64 {
    xp % XP_PER_LEVEL
}

/// XP still needed to reach the next level.
pub fn xp_to_next_level(xp: u64) -> u64 {
    XP_PER_LEVEL - progress_within_level(xp)
}

/// XP after reversing a grant of `granted`, clamped at zero.
pub fn revert_xp(current: u64, granted: u64) -> u64 {
    current.saturating_sub(granted)
}

/// `priority_weight * 10 + duration_minutes / 30`
pub fn priority_duration_xp(task: &Task) -> u64 {
    task.priority.weight() * PRIORITY_XP_MULTIPLIER
        + u64::from(task.duration_minutes / DURATION_BLOCK_MINUTES)
}

/// `round(duration_minutes / 30 * 10 * category_multiplier)`
// duration is a u32, so the product is finite and non-negative
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn category_duration_xp(task: &Task) -> u64 {
    let blocks = f64::from(task.duration_minutes) / f64::from(DURATION_BLOCK_MINUTES);
    (blocks * CATEGORY_XP_PER_BLOCK * task.category.xp_multiplier()).round() as u64
}

/// XP granted for completing `task` under `formula`.
pub fn xp_for_task(formula: XpFormula, task: &Task) -> u64 {
    match formula {
        XpFormula::PriorityDuration => priority_duration_xp(task),
        XpFormula::CategoryDuration => category_duration_xp(task),
    }
}
