use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::project::{Project, ProjectChanges, ProjectListing, ProjectStatus};
use crate::database::models::user::SelectOption;

const COLUMNS: &str = "id, name, description, status, priority, budget, due_date, client_id, manager_id, \
                       team_id, created_at, updated_at";

const LISTING: &str = r#"
    SELECT p.id, p.name, p.description, p.status, p.priority, p.budget, p.due_date, p.client_id,
           p.manager_id, p.team_id, p.created_at, p.updated_at,
           c.name AS client_name, m.name AS manager_name, t.name AS team_name
    FROM projects p
    JOIN users c ON c.id = p.client_id
    JOIN users m ON m.id = p.manager_id
    LEFT JOIN teams t ON t.id = p.team_id
"#;

/// Which slice of the project list a caller sees
#[derive(Debug, Clone, Copy)]
pub enum ProjectScope {
    All,
    Client(Uuid),
    Manager(Uuid),
    TeamMember(Uuid),
}

pub async fn list<'e>(db: impl PgExecutor<'e>, scope: ProjectScope) -> Result<Vec<ProjectListing>, DatabaseError> {
    let (filter, user_id) = match scope {
        ProjectScope::All => ("", None),
        ProjectScope::Client(id) => ("WHERE p.client_id = $1", Some(id)),
        ProjectScope::Manager(id) => ("WHERE p.manager_id = $1", Some(id)),
        ProjectScope::TeamMember(id) => (
            "WHERE p.team_id IN (SELECT tm.team_id FROM team_members tm \
             JOIN teams mt ON mt.id = tm.team_id \
             WHERE tm.user_id = $1 AND tm.is_active = TRUE AND mt.is_active = TRUE)",
            Some(id),
        ),
    };

    let sql = format!("{LISTING} {filter} ORDER BY p.created_at DESC");
    let mut query = sqlx::query_as::<_, ProjectListing>(&sql);
    if let Some(id) = user_id {
        query = query.bind(id);
    }
    Ok(query.fetch_all(db).await?)
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Project>, DatabaseError> {
    let project = sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(project)
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, changes: &ProjectChanges) -> Result<Project, DatabaseError> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (name, description, status, priority, budget, due_date, client_id, manager_id, team_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"
    ))
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.budget)
    .bind(changes.due_date)
    .bind(changes.client_id)
    .bind(changes.manager_id)
    .bind(changes.team_id)
    .fetch_one(db)
    .await?;
    Ok(project)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &ProjectChanges,
) -> Result<Option<Project>, DatabaseError> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET name = $2, description = $3, status = $4, priority = $5, budget = $6, \
         due_date = $7, client_id = $8, manager_id = $9, team_id = $10, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.budget)
    .bind(changes.due_date)
    .bind(changes.client_id)
    .bind(changes.manager_id)
    .bind(changes.team_id)
    .fetch_optional(db)
    .await?;
    Ok(project)
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// (team id, status) for every project attached to a team, or to `team_id` alone
pub async fn team_statuses<'e>(
    db: impl PgExecutor<'e>,
    team_id: Option<Uuid>,
) -> Result<Vec<(Uuid, ProjectStatus)>, DatabaseError> {
    let rows = sqlx::query_as::<_, (Uuid, ProjectStatus)>(
        "SELECT team_id, status FROM projects \
         WHERE team_id IS NOT NULL AND ($1::uuid IS NULL OR team_id = $1)",
    )
    .bind(team_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn team_options<'e>(db: impl PgExecutor<'e>) -> Result<Vec<SelectOption>, DatabaseError> {
    let teams = sqlx::query_as::<_, SelectOption>("SELECT id, name FROM teams ORDER BY name ASC")
        .fetch_all(db)
        .await?;
    Ok(teams)
}
