// handlers/protected/tasks.rs - /api/tasks

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::task::TaskListing;
use crate::database::models::Task;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tasks::TaskRequest;
use crate::state::AppState;

/// GET /api/tasks - All tasks for admins, managed projects for PMs, own tasks otherwise
pub async fn tasks_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<TaskListing>> {
    Ok(ApiResponse::success(state.tasks.list(&principal).await?))
}

/// POST /api/tasks
pub async fn tasks_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<TaskRequest>,
) -> ApiResult<Task> {
    Ok(ApiResponse::created(state.tasks.create(&principal, request).await?))
}

/// PUT /api/tasks/:id
pub async fn tasks_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<TaskRequest>,
) -> ApiResult<Task> {
    Ok(ApiResponse::success(state.tasks.update(&principal, id, request).await?))
}

/// DELETE /api/tasks/:id
pub async fn tasks_delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    state.tasks.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
