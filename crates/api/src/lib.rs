//! # Questlog API
//!
//! HTTP application layer - routes and main entry point.
//!
//! This crate contains:
//! - axum routes (HTTP → task service bridge)
//! - Application context (dependency injection)
//! - Error-to-response mapping
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod error;
pub mod routes;
pub mod utils;

pub use context::{AppContext, Stores};
pub use error::{ApiError, ApiResult};
pub use routes::router;
