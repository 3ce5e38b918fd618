// handlers/protected/teams.rs - /api/teams and team membership

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::team::TeamSummary;
use crate::database::models::user::SelectOption;
use crate::database::models::TeamMember;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::teams::{AddMemberRequest, MemberRoleRequest, TeamRequest};
use crate::state::AppState;

/// GET /api/teams - Teams with members, lead and active project count
pub async fn teams_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<TeamSummary>> {
    Ok(ApiResponse::success(state.teams.list(&principal).await?))
}

/// GET /api/teams/member-options - Active team members and managers
pub async fn teams_member_options(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<SelectOption>> {
    Ok(ApiResponse::success(state.teams.member_options(&principal).await?))
}

/**
 * POST /api/teams - Create a team with its roster
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Design",
 *   "description": "Brand and UI",
 *   "members": ["user-uuid-1", "user-uuid-2"],
 *   "team_lead_id": "user-uuid-1"
 * }
 * ```
 *
 * The lead is added to the roster when missing and is the only LEAD member.
 */
pub async fn teams_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<TeamRequest>,
) -> ApiResult<TeamSummary> {
    Ok(ApiResponse::created(state.teams.create(&principal, request).await?))
}

/// PUT /api/teams/:id - Replace details, roster and lead
pub async fn teams_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<TeamRequest>,
) -> ApiResult<TeamSummary> {
    Ok(ApiResponse::success(state.teams.update(&principal, id, request).await?))
}

/// DELETE /api/teams/:id
pub async fn teams_delete(State(state): State<AppState>, principal: Principal, Path(id): Path<Uuid>) -> ApiResult<Value> {
    state.teams.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// POST /api/teams/:id/members - Add or reactivate a member
pub async fn team_member_add(
    State(state): State<AppState>,
    principal: Principal,
    Path(team_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<AddMemberRequest>,
) -> ApiResult<TeamMember> {
    Ok(ApiResponse::created(state.teams.add_member(&principal, team_id, request).await?))
}

/// PUT /api/teams/:id/members/:member_id - Change role; promoting to LEAD demotes the previous lead
pub async fn team_member_update(
    State(state): State<AppState>,
    principal: Principal,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
    WithRejection(Json(request), _): JsonBody<MemberRoleRequest>,
) -> ApiResult<TeamMember> {
    Ok(ApiResponse::success(
        state.teams.update_member_role(&principal, team_id, member_id, request).await?,
    ))
}

/// DELETE /api/teams/:id/members/:member_id
pub async fn team_member_remove(
    State(state): State<AppState>,
    principal: Principal,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    state.teams.remove_member(&principal, team_id, member_id).await?;
    Ok(ApiResponse::success(json!({ "id": member_id, "team_id": team_id, "removed": true })))
}
