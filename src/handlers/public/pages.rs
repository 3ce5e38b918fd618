// handlers/public/pages.rs - GET /, GET /health, GET /unauthorized

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::rbac;
use crate::state::AppState;

/// GET / - Landing descriptor for anonymous visitors
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Agency API",
            "version": env!("CARGO_PKG_VERSION"),
            "signin": rbac::SIGN_IN_PATH,
            "endpoints": {
                "public": ["/", "/health", "/auth/signin", "/auth/signout", "/unauthorized"],
                "session": ["/api/auth/session", "/api/auth/session/refresh"],
                "api": ["/api/projects", "/api/tasks", "/api/teams", "/api/invoices", "/api/messages"],
                "admin": ["/api/users"],
                "dashboard": ["/dashboard/client", "/dashboard/team-member", "/dashboard/project-manager", "/dashboard/admin"]
            }
        }
    }))
}

/**
 * GET /health - Database health check
 *
 * Output (healthy, 200):
 * ```json
 * { "success": true, "data": { "status": "healthy", "database": "connected" } }
 * ```
 *
 * Output (unreachable, 503):
 * ```json
 * { "error": true, "message": "Database unavailable", "code": "SERVICE_UNAVAILABLE" }
 * ```
 */
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "healthy",
                    "database": "connected",
                    "timestamp": chrono::Utc::now()
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE"
                })),
            )
        }
    }
}

/// GET /unauthorized - Page the guard sends a signed-in user to on a role mismatch
pub async fn unauthorized() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "page": "unauthorized",
            "message": "You do not have permission to view this page",
            "signin": rbac::SIGN_IN_PATH
        }
    }))
}
