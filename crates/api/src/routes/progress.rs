use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use questlog_domain::ProgressionSnapshot;

use super::UserId;
use crate::context::AppContext;
use crate::error::ApiResult;

/// `GET /progress`: the caller's XP, level, streak and achievements.
pub async fn get_progress(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
) -> ApiResult<ProgressionSnapshot> {
    Ok(Json(ctx.tasks.progression().snapshot(&user_id).await?))
}
