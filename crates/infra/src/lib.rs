//! # Questlog Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite) and an in-memory fallback store
//! - HTTP client with retries
//! - Google Calendar sync adapter
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `questlog-core`
//! - Depends on `questlog-common`, `questlog-domain` and `questlog-core`
//! - Contains all "impure" code (I/O, network, environment)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod memory;
pub mod observability;

// Re-export commonly used items
pub use database::{DbManager, SqliteProgressRepository, SqliteTaskRepository};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::calendar::GoogleCalendarSync;
pub use memory::MemoryStore;
