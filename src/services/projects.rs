use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{validate_with, ServiceError};
use crate::auth::Principal;
use crate::database::models::project::{Priority, Project, ProjectChanges, ProjectFormOptions, ProjectListing, ProjectStatus};
use crate::database::models::Role;
use crate::database::repositories::projects::{self as repo, ProjectScope};
use crate::database::repositories::users;
use crate::rbac::require_any_role;

const EDITORS: [Role; 2] = [Role::Admin, Role::ProjectManager];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 2, message = "Project name must be at least 2 characters"))]
    pub name: String,

    #[validate(length(min = 5, message = "Description must be at least 5 characters"))]
    pub description: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub priority: Priority,

    pub budget: Decimal,
    pub due_date: DateTime<Utc>,
    pub client_id: Uuid,
    pub manager_id: Uuid,
    pub team_id: Option<Uuid>,
}

impl ProjectRequest {
    fn into_changes(self) -> Result<ProjectChanges, ServiceError> {
        validate_with(&self, |errors| {
            if self.budget < Decimal::ZERO {
                errors.insert("budget".into(), "Budget must be a positive number".into());
            }
        })?;

        Ok(ProjectChanges {
            name: self.name,
            description: self.description,
            status: self.status,
            priority: self.priority,
            budget: self.budget,
            due_date: self.due_date,
            client_id: self.client_id,
            manager_id: self.manager_id,
            team_id: self.team_id,
        })
    }
}

/// The slice of projects a role sees
pub fn scope_for(principal: &Principal) -> ProjectScope {
    match principal.role {
        Role::Admin => ProjectScope::All,
        Role::Client => ProjectScope::Client(principal.id),
        Role::ProjectManager => ProjectScope::Manager(principal.id),
        Role::TeamMember => ProjectScope::TeamMember(principal.id),
    }
}

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<ProjectListing>, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        Ok(repo::list(&self.pool, scope_for(principal)).await?)
    }

    pub async fn create(&self, principal: &Principal, request: ProjectRequest) -> Result<Project, ServiceError> {
        require_any_role(principal, &EDITORS)?;
        let changes = request.into_changes()?;
        let project = repo::insert(&self.pool, &changes).await?;
        info!("Project '{}' created by {}", project.name, principal.email);
        Ok(project)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: ProjectRequest,
    ) -> Result<Project, ServiceError> {
        require_any_role(principal, &EDITORS)?;
        let changes = request.into_changes()?;
        repo::update(&self.pool, id, &changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_any_role(principal, &EDITORS)?;
        if !repo::delete(&self.pool, id).await? {
            return Err(ServiceError::not_found("Project"));
        }
        info!("Project {} deleted by {}", id, principal.email);
        Ok(())
    }

    /// Choices for the client, manager and team pickers
    pub async fn form_options(&self, principal: &Principal) -> Result<ProjectFormOptions, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        let (clients, managers, teams) = futures::try_join!(
            users::options_for_role(&self.pool, Role::Client),
            users::options_for_role(&self.pool, Role::ProjectManager),
            repo::team_options(&self.pool),
        )?;
        Ok(ProjectFormOptions {
            clients,
            managers,
            teams,
        })
    }
}
