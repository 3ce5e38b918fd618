// handlers/public/signin.rs - GET/POST /auth/signin, POST /auth/signout

use axum::{
    extract::{Query, State},
    response::Json,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::Principal;
use crate::config;
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::ApiResponse;
use crate::rbac;
use crate::services::session::{IssuedSession, SignInRequest, ACCOUNT_DEACTIVATED};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInPageQuery {
    pub error: Option<String>,
}

/// Readable text for the error codes the guard appends to the sign-in URL
fn signin_error_message(code: &str) -> &'static str {
    match code {
        rbac::DEACTIVATED_ERROR => ACCOUNT_DEACTIVATED,
        _ => "Unable to sign in",
    }
}

/// GET /auth/signin - Sign-in page descriptor, echoing any `?error=` code
pub async fn signin_page(Query(query): Query<SignInPageQuery>) -> Json<Value> {
    let error = query.error.as_deref().map(|code| {
        json!({
            "code": code,
            "message": signin_error_message(code)
        })
    });

    Json(json!({
        "success": true,
        "data": {
            "page": "signin",
            "action": rbac::SIGN_IN_PATH,
            "fields": ["email", "password"],
            "error": error
        }
    }))
}

/**
 * POST /auth/signin - Verify credentials and start a session
 *
 * Expected Input:
 * ```json
 * { "email": "admin@agency.test", "password": "secret1" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "data": {
 *     "user": { "id": "...", "email": "admin@agency.test", "name": "Admin", "role": "ADMIN", "is_active": true },
 *     "token": "eyJhbGciOiJIUzI1NiI...",
 *     "expires_at": "2024-01-01T00:00:00Z",
 *     "redirect": "/dashboard/admin"
 *   }
 * }
 * ```
 *
 * The token is also set as an HttpOnly session cookie. Unknown emails and
 * wrong passwords both answer 401 "Invalid credentials".
 */
pub async fn signin_post(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): JsonBody<SignInRequest>,
) -> Result<(CookieJar, ApiResponse<IssuedSession>), ApiError> {
    let session = state.session.sign_in(request).await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, ApiResponse::success(session)))
}

/// POST /auth/signout - Clear the session cookie
///
/// The expired cookie goes out whether or not the request carried one, so a
/// bearer-authenticated caller signing out also drops any browser session.
pub async fn signout_post(principal: Option<Principal>, jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    if let Some(principal) = principal {
        info!("{} signed out", principal.email);
    }
    let jar = jar.add(expired_session_cookie());
    (jar, ApiResponse::success(json!({ "redirect": rbac::SIGN_IN_PATH })))
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    let security = &config::config().security;
    Cookie::build((security.session_cookie_name.clone(), token))
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(security.session_max_age_hours as i64))
        .build()
}

fn expired_session_cookie() -> Cookie<'static> {
    let security = &config::config().security;
    Cookie::build((security.session_cookie_name.clone(), ""))
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_scoped_to_root() {
        let cookie = session_cookie("token-value".to_string());
        assert_eq!(cookie.name(), config::config().security.session_cookie_name);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.max_age().is_some());
    }

    #[test]
    fn expired_cookie_matches_session_cookie_scope() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.name(), config::config().security.session_cookie_name);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn deactivated_code_reads_as_account_message() {
        assert_eq!(signin_error_message("account-deactivated"), "Account is deactivated");
        assert_eq!(signin_error_message("something-else"), "Unable to sign in");
    }
}
