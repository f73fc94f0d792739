//! Domain types and models

pub mod progress;
pub mod task;

pub use progress::{Achievement, AchievementKind, ProgressionSnapshot, UserProgress};
pub use task::{NewTask, Priority, Task, TaskCategory, TaskFilter, TaskPatch};
