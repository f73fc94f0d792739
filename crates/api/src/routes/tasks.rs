//! Task endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use questlog_core::TaskUpdateOutcome;
use questlog_domain::{NewTask, Task, TaskFilter, TaskPatch};
use tracing::debug;

use super::UserId;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

/// `GET /tasks?completed=<bool>`
pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Vec<Task>> {
    Ok(Json(ctx.tasks.list_tasks(&user_id, filter).await?))
}

/// `POST /tasks`
pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(input): Json<NewTask>,
) -> Result<(StatusCode, Json<TaskUpdateOutcome>), ApiError> {
    let outcome = ctx.tasks.create_task(&user_id, input).await?;
    debug!(user_id = %user_id, task_id = %outcome.task.id, "task created");
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /tasks/{id}`
pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
) -> ApiResult<Task> {
    Ok(Json(ctx.tasks.get_task(&user_id, &task_id).await?))
}

/// `PUT /tasks/{id}`: partial update; `completed` toggles go through the
/// progression engine.
pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<TaskUpdateOutcome> {
    Ok(Json(ctx.tasks.update_task(&user_id, &task_id, patch).await?))
}

/// `DELETE /tasks/{id}`
pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(task_id): Path<String>,
) -> ApiResult<TaskUpdateOutcome> {
    Ok(Json(ctx.tasks.delete_task(&user_id, &task_id).await?))
}
