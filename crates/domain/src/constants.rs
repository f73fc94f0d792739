//! Application constants
//!
//! Centralized location for the progression rules' fixed numbers.

// Leveling
pub const XP_PER_LEVEL: u64 = 100;

// XP grants
pub const PRIORITY_XP_MULTIPLIER: u64 = 10;
pub const DURATION_BLOCK_MINUTES: u32 = 30;
pub const CATEGORY_XP_PER_BLOCK: f64 = 10.0;

// Streaks
pub const STREAK_MILESTONES: [u32; 3] = [7, 30, 100];
pub const DEFAULT_STREAK_GRACE_DAYS: u32 = 0;

// Achievements
pub const DAILY_WARRIOR_ID: &str = "daily-warrior";
pub const DAILY_WARRIOR_THRESHOLD: usize = 5;
pub const WEEKLY_STREAK_ID: &str = "weekly-streak";
pub const WEEKLY_COVERAGE_DAYS: u32 = 7;

// Storage
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// Orchestration
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

// Validation
pub const MAX_TITLE_LENGTH: usize = 200;
