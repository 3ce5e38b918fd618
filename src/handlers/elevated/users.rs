// handlers/elevated/users.rs - /api/users (ADMIN)

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::user::UserWithProjects;
use crate::database::models::User;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::users::{CreateUserRequest, UpdateUserRequest};
use crate::state::AppState;

/// GET /api/users - Users with the number of projects they own or manage
pub async fn users_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<UserWithProjects>> {
    Ok(ApiResponse::success(state.users.list(&principal).await?))
}

/// GET /api/users/:id
pub async fn users_get(State(state): State<AppState>, principal: Principal, Path(id): Path<Uuid>) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.get(&principal, id).await?))
}

/**
 * POST /api/users - Create an account
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Casey Client",
 *   "email": "casey@client.test",
 *   "password": "secret1",
 *   "role": "CLIENT",
 *   "phone": null,
 *   "timezone": "UTC"
 * }
 * ```
 *
 * Answers 409 "User with this email already exists" for a duplicate email.
 * The password hash is never returned.
 */
pub async fn users_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<CreateUserRequest>,
) -> ApiResult<User> {
    Ok(ApiResponse::created(state.users.create(&principal, request).await?))
}

/// PUT /api/users/:id
pub async fn users_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateUserRequest>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.update(&principal, id, request).await?))
}

/// POST /api/users/:id/toggle-status - Activate or deactivate; not for your own account
pub async fn users_toggle_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.toggle_status(&principal, id).await?))
}

/// DELETE /api/users/:id - Refused for your own account or one with projects, invoices or tasks
pub async fn users_delete(State(state): State<AppState>, principal: Principal, Path(id): Path<Uuid>) -> ApiResult<Value> {
    state.users.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
