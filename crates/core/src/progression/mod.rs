//! Progression engine: XP, levels, streaks and achievements

pub mod achievements;
pub mod locks;
pub mod ports;
pub mod service;
pub mod streak;
pub mod xp;

pub use locks::{UserLockGuard, UserLockRegistry};
pub use ports::{ProgressCommit, ProgressRepository};
pub use service::{ProgressionService, ProgressionSettings};
pub use streak::StreakTracker;
