use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Ordering is not a hierarchy; see `rbac` for the access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    TeamMember,
    ProjectManager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Client, Role::TeamMember, Role::ProjectManager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::TeamMember => "TEAM_MEMBER",
            Role::ProjectManager => "PROJECT_MANAGER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| format!("Unknown role '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub timezone: String,
    pub avatar: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User row plus the number of projects they own or manage
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWithProjects {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub projects_count: i64,
}

/// Counts of records that pin a user in place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserAssociations {
    pub client_projects: i64,
    pub managed_projects: i64,
    pub invoices: i64,
    pub assigned_tasks: i64,
    pub created_tasks: i64,
}

impl UserAssociations {
    pub fn is_empty(&self) -> bool {
        self.client_projects == 0
            && self.managed_projects == 0
            && self.invoices == 0
            && self.assigned_tasks == 0
            && self.created_tasks == 0
    }
}

/// Minimal id + name pair used by form option lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SelectOption {
    pub id: Uuid,
    pub name: String,
}

/// Initials shown in place of an avatar, e.g. "Ada Lovelace" -> "AL"
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_loosely() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("team-member".parse::<Role>().unwrap(), Role::TeamMember);
        assert_eq!("PROJECT_MANAGER".parse::<Role>().unwrap(), Role::ProjectManager);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_in_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&Role::TeamMember).unwrap(), "\"TEAM_MEMBER\"");
    }

    #[test]
    fn builds_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("  dev   one "), "DO");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn empty_associations() {
        assert!(UserAssociations::default().is_empty());
        let pinned = UserAssociations { invoices: 1, ..Default::default() };
        assert!(!pinned.is_empty());
    }
}
