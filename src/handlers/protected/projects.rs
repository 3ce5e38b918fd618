// handlers/protected/projects.rs - /api/projects

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::project::{ProjectFormOptions, ProjectListing};
use crate::database::models::Project;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::projects::ProjectRequest;
use crate::state::AppState;

/// GET /api/projects - Projects visible to the caller's role
pub async fn projects_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<ProjectListing>> {
    Ok(ApiResponse::success(state.projects.list(&principal).await?))
}

/// GET /api/projects/options - Clients, managers and teams for the project form
pub async fn projects_options(State(state): State<AppState>, principal: Principal) -> ApiResult<ProjectFormOptions> {
    Ok(ApiResponse::success(state.projects.form_options(&principal).await?))
}

/// POST /api/projects
pub async fn projects_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<ProjectRequest>,
) -> ApiResult<Project> {
    Ok(ApiResponse::created(state.projects.create(&principal, request).await?))
}

/// PUT /api/projects/:id
pub async fn projects_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<ProjectRequest>,
) -> ApiResult<Project> {
    Ok(ApiResponse::success(state.projects.update(&principal, id, request).await?))
}

/// DELETE /api/projects/:id
pub async fn projects_delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    state.projects.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
