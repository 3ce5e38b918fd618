// handlers/protected/session.rs - GET /api/auth/session, POST /api/auth/session/refresh

use axum::extract::State;
use axum_extra::extract::CookieJar;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::handlers::public::signin::session_cookie;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::session::IssuedSession;
use crate::state::AppState;

/**
 * GET /api/auth/session - Current principal
 *
 * Output:
 * ```json
 * {
 *   "success": true,
 *   "data": { "id": "...", "email": "pm@agency.test", "name": "Pat", "role": "PROJECT_MANAGER", "is_active": true }
 * }
 * ```
 */
pub async fn session_get(principal: Principal) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}

/// POST /api/auth/session/refresh - Reissue the token from the current account row
pub async fn session_refresh(
    State(state): State<AppState>,
    principal: Principal,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<IssuedSession>), ApiError> {
    let session = state.session.refresh(&principal).await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, ApiResponse::success(session)))
}
