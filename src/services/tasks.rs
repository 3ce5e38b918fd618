use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::ServiceError;
use crate::auth::Principal;
use crate::database::models::project::Priority;
use crate::database::models::task::{Task, TaskChanges, TaskListing, TaskStatus};
use crate::database::models::Role;
use crate::database::repositories::projects;
use crate::database::repositories::tasks::{self as repo, TaskScope};
use crate::rbac::require_any_role;

const EDITORS: [Role; 2] = [Role::Admin, Role::ProjectManager];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 2, message = "Task title must be at least 2 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    pub deadline: Option<DateTime<Utc>>,

    #[validate(range(min = 0, message = "Estimated hours cannot be negative"))]
    pub estimated_hours: Option<i32>,

    #[validate(range(min = 0, message = "Actual hours cannot be negative"))]
    pub actual_hours: Option<i32>,

    pub assignee_id: Option<Uuid>,
    pub project_id: Uuid,
}

impl From<TaskRequest> for TaskChanges {
    fn from(request: TaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description.filter(|d| !d.trim().is_empty()),
            status: request.status,
            priority: request.priority,
            deadline: request.deadline,
            estimated_hours: request.estimated_hours,
            actual_hours: request.actual_hours,
            assignee_id: request.assignee_id,
            project_id: request.project_id,
        }
    }
}

/// Clients have no task board
pub fn scope_for(principal: &Principal) -> Option<TaskScope> {
    match principal.role {
        Role::Admin => Some(TaskScope::All),
        Role::ProjectManager => Some(TaskScope::Manager(principal.id)),
        Role::TeamMember => Some(TaskScope::Assignee(principal.id)),
        Role::Client => None,
    }
}

#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<TaskListing>, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        let scope = scope_for(principal).ok_or(ServiceError::Unauthorized)?;
        let rows = repo::list(&self.pool, scope).await?;
        Ok(rows.into_iter().map(TaskListing::from).collect())
    }

    pub async fn create(&self, principal: &Principal, request: TaskRequest) -> Result<Task, ServiceError> {
        require_any_role(principal, &EDITORS)?;
        request.validate()?;
        self.ensure_project(request.project_id).await?;

        let task = repo::insert(&self.pool, &request.into(), principal.id).await?;
        info!("Task '{}' created by {}", task.title, principal.email);
        Ok(task)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, request: TaskRequest) -> Result<Task, ServiceError> {
        require_any_role(principal, &EDITORS)?;
        request.validate()?;
        self.ensure_project(request.project_id).await?;

        repo::update(&self.pool, id, &request.into())
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_any_role(principal, &EDITORS)?;
        let task = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;
        repo::delete(&self.pool, id).await?;
        info!("Task '{}' deleted by {}", task.title, principal.email);
        Ok(())
    }

    async fn ensure_project(&self, project_id: Uuid) -> Result<(), ServiceError> {
        match projects::find_by_id(&self.pool, project_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("Project")),
        }
    }
}
