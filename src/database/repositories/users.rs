use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::user::{Role, SelectOption, User, UserAssociations, UserWithProjects};

const COLUMNS: &str = "id, name, email, password_hash, role, is_active, phone, timezone, avatar, \
                       last_login_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub timezone: String,
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_email<'e>(db: impl PgExecutor<'e>, email: &str) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// True when `email` belongs to a user other than `id`
pub async fn email_taken_by_other<'e>(
    db: impl PgExecutor<'e>,
    email: &str,
    id: Uuid,
) -> Result<bool, DatabaseError> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
        .bind(email)
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(taken)
}

pub async fn list_with_project_counts<'e>(db: impl PgExecutor<'e>) -> Result<Vec<UserWithProjects>, DatabaseError> {
    let users = sqlx::query_as::<_, UserWithProjects>(
        r#"
        SELECT u.id, u.name, u.email, u.password_hash, u.role, u.is_active, u.phone, u.timezone,
               u.avatar, u.last_login_at, u.created_at, u.updated_at,
               (SELECT COUNT(*) FROM projects p WHERE p.client_id = u.id OR p.manager_id = u.id) AS projects_count
        FROM users u
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, new_user: &NewUser) -> Result<User, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, role, phone, timezone, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE) RETURNING {COLUMNS}"
    ))
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role)
    .bind(&new_user.phone)
    .bind(&new_user.timezone)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &UserChanges,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = $2, email = $3, role = $4, phone = $5, timezone = $6, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.email)
    .bind(changes.role)
    .bind(&changes.phone)
    .bind(&changes.timezone)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn set_active<'e>(db: impl PgExecutor<'e>, id: Uuid, is_active: bool) -> Result<User, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(is_active)
    .fetch_optional(db)
    .await?;
    user.ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
}

pub async fn touch_last_login<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn associations<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<UserAssociations, DatabaseError> {
    let counts = sqlx::query_as::<_, UserAssociations>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM projects WHERE client_id = $1)  AS client_projects,
            (SELECT COUNT(*) FROM projects WHERE manager_id = $1) AS managed_projects,
            (SELECT COUNT(*) FROM invoices WHERE client_id = $1)  AS invoices,
            (SELECT COUNT(*) FROM tasks WHERE assignee_id = $1)   AS assigned_tasks,
            (SELECT COUNT(*) FROM tasks WHERE created_by = $1)    AS created_tasks
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(counts)
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active users holding `role`, ordered by name
pub async fn options_for_role<'e>(db: impl PgExecutor<'e>, role: Role) -> Result<Vec<SelectOption>, DatabaseError> {
    let options = sqlx::query_as::<_, SelectOption>(
        "SELECT id, name FROM users WHERE role = $1 AND is_active = TRUE ORDER BY name ASC",
    )
    .bind(role)
    .fetch_all(db)
    .await?;
    Ok(options)
}

/// Active users who can be placed on a team
pub async fn team_member_options<'e>(db: impl PgExecutor<'e>) -> Result<Vec<SelectOption>, DatabaseError> {
    let options = sqlx::query_as::<_, SelectOption>(
        "SELECT id, name FROM users \
         WHERE is_active = TRUE AND role IN ('TEAM_MEMBER', 'PROJECT_MANAGER') \
         ORDER BY name ASC",
    )
    .fetch_all(db)
    .await?;
    Ok(options)
}
