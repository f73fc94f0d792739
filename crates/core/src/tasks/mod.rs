//! Task management

pub mod ports;
pub mod service;

pub use ports::{CalendarSync, CompletionRecord, TaskRepository};
pub use service::{SyncWarning, TaskService, TaskUpdateOutcome};
