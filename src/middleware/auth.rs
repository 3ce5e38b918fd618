use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{self, Principal};
use crate::config;
use crate::error::ApiError;
use crate::rbac::{self, AccessDecision};

/// Decodes the session from the Authorization header or the session cookie and
/// stores the `Principal` in request extensions. A missing or invalid token
/// leaves the request anonymous; the access guard decides what that means.
pub async fn session_middleware(jar: CookieJar, mut request: Request, next: Next) -> Response {
    if let Some(token) = session_token(request.headers(), &jar) {
        match auth::verify_session(&token) {
            Ok(principal) => {
                request.extensions_mut().insert(principal);
            }
            Err(e) => debug!("Ignoring session token on {}: {}", request.uri().path(), e),
        }
    }
    next.run(request).await
}

/// Bearer token first, then the session cookie
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => jar
            .get(&config::config().security.session_cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}

/// Applies `rbac::authorize` to every request
pub async fn access_guard(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let decision = rbac::authorize(&path, request.extensions().get::<Principal>());

    match decision {
        AccessDecision::Continue => next.run(request).await,
        AccessDecision::Deny(status) => {
            warn!("Denied {} {} with {}", request.method(), path, status.as_u16());
            (status, Json(json!({ "error": "Unauthorized" }))).into_response()
        }
        redirect => {
            let location = redirect.location().unwrap_or_else(|| rbac::SIGN_IN_PATH.to_string());
            if !matches!(redirect, AccessDecision::RedirectDashboard(_)) {
                warn!("Redirecting {} to {}", path, location);
            }
            Redirect::to(&location).into_response()
        }
    }
}

/// Handlers that need a signed-in caller take `Principal` as an argument
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not signed in"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        let jar = CookieJar::new().add(Cookie::new(
            config::config().security.session_cookie_name.clone(),
            "cookie-token",
        ));
        assert_eq!(session_token(&headers, &jar).as_deref(), Some("header-token"));
        assert_eq!(session_token(&HeaderMap::new(), &jar).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn malformed_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers, &CookieJar::new()), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(session_token(&headers, &CookieJar::new()), None);
    }
}
