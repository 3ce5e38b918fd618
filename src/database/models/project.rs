use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::SelectOption;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Pending,
    InProgress,
    Review,
    Completed,
    Archived,
    Cancelled,
}

impl ProjectStatus {
    /// Projects in these states no longer count towards a team's workload
    pub fn is_closed(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Archived | ProjectStatus::Cancelled)
    }
}

/// Shared by projects and tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub budget: Decimal,
    pub due_date: DateTime<Utc>,
    pub client_id: Uuid,
    pub manager_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project joined with the display names of its client, manager and team
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,
    pub client_name: String,
    pub manager_name: String,
    pub team_name: Option<String>,
}

/// Column values written by create and update
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub budget: Decimal,
    pub due_date: DateTime<Utc>,
    pub client_id: Uuid,
    pub manager_id: Uuid,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectFormOptions {
    pub clients: Vec<SelectOption>,
    pub managers: Vec<SelectOption>,
    pub teams: Vec<SelectOption>,
}
