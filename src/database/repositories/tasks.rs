use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::task::{Task, TaskChanges, TaskRow};

const COLUMNS: &str = "id, title, description, status, priority, deadline, estimated_hours, actual_hours, \
                       assignee_id, project_id, created_by, created_at, updated_at";

const LISTING: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.deadline, t.estimated_hours,
           t.actual_hours, t.assignee_id, t.project_id, t.created_by, t.created_at, t.updated_at,
           a.name AS assignee_name, p.name AS project_name, p.client_id AS client_id, c.name AS client_name
    FROM tasks t
    JOIN projects p ON p.id = t.project_id
    JOIN users c ON c.id = p.client_id
    LEFT JOIN users a ON a.id = t.assignee_id
"#;

#[derive(Debug, Clone, Copy)]
pub enum TaskScope {
    All,
    /// Tasks on projects the user manages
    Manager(Uuid),
    /// Tasks assigned to the user
    Assignee(Uuid),
}

pub async fn list<'e>(db: impl PgExecutor<'e>, scope: TaskScope) -> Result<Vec<TaskRow>, DatabaseError> {
    let (filter, user_id) = match scope {
        TaskScope::All => ("", None),
        TaskScope::Manager(id) => ("WHERE p.manager_id = $1", Some(id)),
        TaskScope::Assignee(id) => ("WHERE t.assignee_id = $1", Some(id)),
    };

    let sql = format!("{LISTING} {filter} ORDER BY t.created_at DESC");
    let mut query = sqlx::query_as::<_, TaskRow>(&sql);
    if let Some(id) = user_id {
        query = query.bind(id);
    }
    Ok(query.fetch_all(db).await?)
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Task>, DatabaseError> {
    let task = sqlx::query_as::<_, Task>(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(task)
}

pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    changes: &TaskChanges,
    created_by: Uuid,
) -> Result<Task, DatabaseError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (title, description, status, priority, deadline, estimated_hours, actual_hours, \
         assignee_id, project_id, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COLUMNS}"
    ))
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.deadline)
    .bind(changes.estimated_hours)
    .bind(changes.actual_hours)
    .bind(changes.assignee_id)
    .bind(changes.project_id)
    .bind(created_by)
    .fetch_one(db)
    .await?;
    Ok(task)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &TaskChanges,
) -> Result<Option<Task>, DatabaseError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = $2, description = $3, status = $4, priority = $5, deadline = $6, \
         estimated_hours = $7, actual_hours = $8, assignee_id = $9, project_id = $10, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.deadline)
    .bind(changes.estimated_hours)
    .bind(changes.actual_hours)
    .bind(changes.assignee_id)
    .bind(changes.project_id)
    .fetch_optional(db)
    .await?;
    Ok(task)
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
