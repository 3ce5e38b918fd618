//! Role-based access rules.
//!
//! `authorize` is the route guard: a pure function of the request path and
//! the signed-in principal. `require_role` and `require_any_role` are the
//! per-action checks that services repeat on every call.

use axum::http::StatusCode;

use crate::auth::Principal;
use crate::database::models::Role;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DEACTIVATED_ERROR: &str = "account-deactivated";

/// Dashboard areas and the role that owns each
const DASHBOARD_AREAS: [(&str, Role); 4] = [
    ("/dashboard/client", Role::Client),
    ("/dashboard/team-member", Role::TeamMember),
    ("/dashboard/project-manager", Role::ProjectManager),
    ("/dashboard/admin", Role::Admin),
];

/// API prefixes only an admin may call
const ADMIN_API_PREFIXES: [&str; 2] = ["/api/admin", "/api/users"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Continue,
    RedirectSignIn { error: Option<&'static str> },
    RedirectUnauthorized,
    RedirectDashboard(Role),
    Deny(StatusCode),
}

impl AccessDecision {
    /// Redirect target, for the decisions that redirect
    pub fn location(&self) -> Option<String> {
        match self {
            AccessDecision::RedirectSignIn { error: Some(error) } => Some(format!("{SIGN_IN_PATH}?error={error}")),
            AccessDecision::RedirectSignIn { error: None } => Some(SIGN_IN_PATH.to_string()),
            AccessDecision::RedirectUnauthorized => Some(UNAUTHORIZED_PATH.to_string()),
            AccessDecision::RedirectDashboard(role) => Some(dashboard_path(*role).to_string()),
            AccessDecision::Continue | AccessDecision::Deny(_) => None,
        }
    }
}

pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Client => "/dashboard/client",
        Role::TeamMember => "/dashboard/team-member",
        Role::ProjectManager => "/dashboard/project-manager",
        Role::Admin => "/dashboard/admin",
    }
}

/// True when `path` is `prefix` itself or lies below it. Matching is by whole
/// segments, so `/dashboard/clientele` is not under `/dashboard/client`.
pub fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Role owning the dashboard area `path` falls in
pub fn required_role(path: &str) -> Option<Role> {
    DASHBOARD_AREAS
        .iter()
        .find(|(prefix, _)| is_under(path, prefix))
        .map(|(_, role)| *role)
}

/// Whether `role` may open a page in the area owned by `required`
pub fn can_enter(role: Role, required: Role) -> bool {
    role == required
        || role == Role::Admin
        || (role == Role::ProjectManager && required == Role::TeamMember)
}

fn is_public(path: &str) -> bool {
    path == "/"
        || is_under(path, "/auth")
        || path == UNAUTHORIZED_PATH
        || path == "/health"
        || path == "/favicon.ico"
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

pub fn authorize(path: &str, principal: Option<&Principal>) -> AccessDecision {
    let path = normalize(path);

    if is_public(path) {
        return match (path, principal) {
            ("/", Some(p)) => AccessDecision::RedirectDashboard(p.role),
            _ => AccessDecision::Continue,
        };
    }

    if is_under(path, "/api/auth") {
        return AccessDecision::Continue;
    }

    if is_under(path, "/dashboard") {
        return authorize_dashboard(path, principal);
    }

    if is_under(path, "/api") {
        return authorize_api(path, principal);
    }

    AccessDecision::Continue
}

fn authorize_dashboard(path: &str, principal: Option<&Principal>) -> AccessDecision {
    let Some(principal) = principal else {
        return AccessDecision::RedirectSignIn { error: None };
    };
    if !principal.is_active {
        return AccessDecision::RedirectSignIn {
            error: Some(DEACTIVATED_ERROR),
        };
    }
    if path == "/dashboard" {
        return AccessDecision::RedirectDashboard(principal.role);
    }
    if principal.role == Role::Admin {
        return AccessDecision::Continue;
    }

    match required_role(path) {
        Some(required) if can_enter(principal.role, required) => AccessDecision::Continue,
        _ => AccessDecision::RedirectUnauthorized,
    }
}

fn authorize_api(path: &str, principal: Option<&Principal>) -> AccessDecision {
    let Some(principal) = principal else {
        return AccessDecision::Deny(StatusCode::UNAUTHORIZED);
    };
    if !principal.is_active {
        return AccessDecision::Deny(StatusCode::FORBIDDEN);
    }
    let admin_only = ADMIN_API_PREFIXES.iter().any(|prefix| is_under(path, prefix));
    if admin_only && principal.role != Role::Admin {
        return AccessDecision::Deny(StatusCode::FORBIDDEN);
    }
    AccessDecision::Continue
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unauthorized")]
pub struct AccessDenied;

pub fn require_role(principal: &Principal, role: Role) -> Result<(), AccessDenied> {
    require_any_role(principal, &[role])
}

pub fn require_any_role(principal: &Principal, roles: &[Role]) -> Result<(), AccessDenied> {
    if principal.is_active && roles.contains(&principal.role) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}
