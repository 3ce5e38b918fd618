// handlers/protected/dashboard.rs - GET /dashboard/*
//
// Pages are JSON descriptors: the area (role) the page belongs to, the
// section within it and the navigation for that area. The access guard has
// already matched the caller's role against the area.

use axum::extract::OriginalUri;
use serde::Serialize;

use crate::auth::Principal;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::rbac;

pub const OVERVIEW: &str = "overview";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub area: Role,
    pub section: String,
    pub sections: &'static [&'static str],
    pub home: &'static str,
    pub user: Principal,
    pub user_initials: String,
}

/// Navigation for each dashboard area
pub fn sections(area: Role) -> &'static [&'static str] {
    match area {
        Role::Client => &[OVERVIEW, "projects", "proposals", "invoices", "files", "messages"],
        Role::TeamMember => &[OVERVIEW, "projects", "tasks", "messages"],
        Role::ProjectManager => &[OVERVIEW, "projects", "tasks", "team", "proposals", "invoices", "messages"],
        Role::Admin => &[
            OVERVIEW, "users", "teams", "projects", "tasks", "invoices", "messages", "analytics", "settings",
        ],
    }
}

/// Resolves a dashboard path to its page, or None when no such page exists
pub fn page_for(path: &str, user: Principal) -> Option<DashboardPage> {
    let path = path.trim_end_matches('/');
    let area = rbac::required_role(path)?;
    let rest = path.strip_prefix(rbac::dashboard_path(area))?.trim_start_matches('/');

    let section = match rest {
        "" => OVERVIEW,
        // Deeper paths such as /projects/:id belong to their section
        rest => rest.split('/').next().unwrap_or(OVERVIEW),
    };
    let sections = sections(area);
    if !sections.contains(&section) {
        return None;
    }

    Some(DashboardPage {
        area,
        section: section.to_string(),
        sections,
        home: rbac::dashboard_path(user.role),
        user_initials: crate::database::models::user::initials(&user.name),
        user,
    })
}

/// GET /dashboard/* - Page descriptor for the requested dashboard page
pub async fn dashboard_page(OriginalUri(uri): OriginalUri, principal: Principal) -> ApiResult<DashboardPage> {
    page_for(uri.path(), principal)
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("Page not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "pm@agency.test".into(),
            name: "Pat Morgan".into(),
            role,
            is_active: true,
        }
    }

    #[test]
    fn area_home_is_the_overview() {
        let page = page_for("/dashboard/client", principal(Role::Client)).unwrap();
        assert_eq!(page.area, Role::Client);
        assert_eq!(page.section, OVERVIEW);
        assert_eq!(page.home, "/dashboard/client");
        assert_eq!(page.user_initials, "PM");
    }

    #[test]
    fn nested_paths_resolve_to_their_section() {
        let page = page_for("/dashboard/admin/users/123/", principal(Role::Admin)).unwrap();
        assert_eq!(page.section, "users");
    }

    #[test]
    fn home_follows_the_viewer_not_the_area() {
        let page = page_for("/dashboard/team-member/tasks", principal(Role::ProjectManager)).unwrap();
        assert_eq!(page.area, Role::TeamMember);
        assert_eq!(page.home, "/dashboard/project-manager");
    }

    #[test]
    fn unknown_sections_have_no_page() {
        assert!(page_for("/dashboard/client/users", principal(Role::Client)).is_none());
        assert!(page_for("/dashboard/reports", principal(Role::Admin)).is_none());
    }
}
