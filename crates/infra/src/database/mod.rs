//! SQLite persistence for tasks and user progress

pub mod manager;
pub mod progress_repository;
mod rows;
pub mod task_repository;

pub use manager::DbManager;
pub use progress_repository::SqliteProgressRepository;
pub use task_repository::SqliteTaskRepository;
