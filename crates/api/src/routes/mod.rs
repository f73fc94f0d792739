//! HTTP routes
//!
//! Every route except `/health` acts on behalf of the user named in the
//! `x-user-id` header, which the upstream auth layer sets.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::context::AppContext;

pub mod health;
pub mod progress;
pub mod tasks;
pub mod user;

pub use user::{UserId, USER_ID_HEADER};

/// Create the API router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health::get_health))
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/{id}", get(tasks::get).put(tasks::update).delete(tasks::delete))
        .route("/progress", get(progress::get_progress))
        .with_state(ctx)
}
