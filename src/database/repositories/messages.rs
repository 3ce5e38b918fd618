use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::message::{Message, MessageRow, NewMessage};

const COLUMNS: &str = "id, content, sender_id, recipient_id, project_id, priority, from_admin, read, read_at, \
                       parent_id, created_at";

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Message>, DatabaseError> {
    let message = sqlx::query_as::<_, Message>(&format!("SELECT {COLUMNS} FROM messages WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(message)
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, message: &NewMessage) -> Result<Message, DatabaseError> {
    let message = sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (content, sender_id, recipient_id, project_id, priority, from_admin, parent_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    ))
    .bind(&message.content)
    .bind(message.sender_id)
    .bind(message.recipient_id)
    .bind(message.project_id)
    .bind(message.priority)
    .bind(message.from_admin)
    .bind(message.parent_id)
    .fetch_one(db)
    .await?;
    Ok(message)
}

/// Every message in the threads `user_id` can see, flat.
///
/// A thread is visible when its root was sent by or to the user; admins see
/// every thread. Replies come along with their root at any depth.
pub async fn thread_rows<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    is_admin: bool,
) -> Result<Vec<MessageRow>, DatabaseError> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        WITH RECURSIVE thread AS (
            SELECT m.id, ARRAY[m.id] AS path
            FROM messages m
            WHERE m.parent_id IS NULL
              AND ($2 OR m.sender_id = $1 OR m.recipient_id = $1)
            UNION ALL
            SELECT r.id, thread.path || r.id
            FROM messages r
            JOIN thread ON r.parent_id = thread.id
            WHERE NOT r.id = ANY(thread.path)
        )
        SELECT m.id, m.content, m.sender_id, m.recipient_id, m.project_id, m.priority, m.from_admin,
               m.read, m.read_at, m.parent_id, m.created_at,
               s.name AS sender_name, rcp.name AS recipient_name, p.name AS project_name
        FROM messages m
        JOIN (SELECT DISTINCT id FROM thread) visible ON visible.id = m.id
        JOIN users s ON s.id = m.sender_id
        LEFT JOIN users rcp ON rcp.id = m.recipient_id
        LEFT JOIN projects p ON p.id = m.project_id
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(is_admin)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Flips the read flag; a concurrent or repeated flip keeps the first `read_at`
pub async fn mark_read<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    read_at: DateTime<Utc>,
) -> Result<Message, DatabaseError> {
    let message = sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages SET read = TRUE, read_at = COALESCE(read_at, $2) WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(read_at)
    .fetch_optional(db)
    .await?;
    message.ok_or_else(|| DatabaseError::NotFound("Message not found".to_string()))
}

/// Replies go with their parent through the cascading foreign key
pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
