//! # Questlog Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The progression engine (XP, levels, streaks, achievements)
//! - Port/adapter interfaces (traits) for task and progress stores and
//!   calendar sync
//! - The task service that routes completion changes through the engine
//!
//! ## Architecture Principles
//! - Only depends on `questlog-common` and `questlog-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod progression;
pub mod tasks;

// Re-export specific items to avoid ambiguity
pub use progression::ports::{ProgressCommit, ProgressRepository};
pub use progression::{ProgressionService, ProgressionSettings, UserLockRegistry};
pub use tasks::ports::{CalendarSync, CompletionRecord, TaskRepository};
pub use tasks::{SyncWarning, TaskService, TaskUpdateOutcome};
