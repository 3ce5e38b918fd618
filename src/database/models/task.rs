use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::project::Priority;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat join row backing the task list
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    #[sqlx(flatten)]
    pub task: Task,
    pub assignee_name: Option<String>,
    pub project_name: String,
    pub client_id: Uuid,
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssigneeSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListing {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<AssigneeSummary>,
    pub project: Reference,
    pub client: Reference,
}

impl From<TaskRow> for TaskListing {
    fn from(row: TaskRow) -> Self {
        let assignee = match (row.task.assignee_id, row.assignee_name) {
            (Some(id), Some(name)) => Some(AssigneeSummary {
                id,
                avatar: super::user::initials(&name),
                name,
            }),
            _ => None,
        };
        let project = Reference {
            id: row.task.project_id,
            name: row.project_name,
        };
        Self {
            assignee,
            project,
            client: Reference {
                id: row.client_id,
                name: row.client_name,
            },
            task: row.task,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub project_id: Uuid,
}
