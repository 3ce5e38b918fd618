use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::team::{Team, TeamChanges, TeamMember, TeamMemberRow, TeamRole};

const COLUMNS: &str = "id, name, description, is_active, team_lead_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, team_id, user_id, role, is_active, joined_at";

pub async fn list<'e>(db: impl PgExecutor<'e>) -> Result<Vec<Team>, DatabaseError> {
    let teams = sqlx::query_as::<_, Team>(&format!("SELECT {COLUMNS} FROM teams ORDER BY name ASC"))
        .fetch_all(db)
        .await?;
    Ok(teams)
}

/// Row-locks the team for the rest of the transaction. Lead changes go through
/// here first so two of them on the same team run one after the other.
pub async fn lock<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Team>, DatabaseError> {
    let team = sqlx::query_as::<_, Team>(&format!("SELECT {COLUMNS} FROM teams WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(team)
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, changes: &TeamChanges) -> Result<Team, DatabaseError> {
    let team = sqlx::query_as::<_, Team>(&format!(
        "INSERT INTO teams (name, description, is_active, team_lead_id) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.is_active)
    .bind(changes.team_lead_id)
    .fetch_one(db)
    .await?;
    Ok(team)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &TeamChanges,
) -> Result<Option<Team>, DatabaseError> {
    let team = sqlx::query_as::<_, Team>(&format!(
        "UPDATE teams SET name = $2, description = $3, is_active = $4, team_lead_id = $5, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.is_active)
    .bind(changes.team_lead_id)
    .fetch_optional(db)
    .await?;
    Ok(team)
}

pub async fn set_lead<'e>(db: impl PgExecutor<'e>, id: Uuid, lead: Option<Uuid>) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE teams SET team_lead_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(lead)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Memberships with user display fields; every team when `team_id` is `None`.
/// The lead sorts first, then members by join date.
pub async fn member_rows<'e>(
    db: impl PgExecutor<'e>,
    team_id: Option<Uuid>,
) -> Result<Vec<TeamMemberRow>, DatabaseError> {
    let rows = sqlx::query_as::<_, TeamMemberRow>(
        r#"
        SELECT tm.id, tm.team_id, tm.user_id, tm.role, tm.is_active, tm.joined_at,
               u.name AS user_name, u.avatar AS user_avatar
        FROM team_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE $1::uuid IS NULL OR tm.team_id = $1
        ORDER BY tm.team_id, (tm.role = 'LEAD') DESC, tm.joined_at ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn members_of<'e>(db: impl PgExecutor<'e>, team_id: Uuid) -> Result<Vec<TeamMember>, DatabaseError> {
    let members = sqlx::query_as::<_, TeamMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 ORDER BY joined_at ASC"
    ))
    .bind(team_id)
    .fetch_all(db)
    .await?;
    Ok(members)
}

pub async fn find_member<'e>(
    db: impl PgExecutor<'e>,
    team_id: Uuid,
    member_id: Uuid,
) -> Result<Option<TeamMember>, DatabaseError> {
    let member = sqlx::query_as::<_, TeamMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND id = $2"
    ))
    .bind(team_id)
    .bind(member_id)
    .fetch_optional(db)
    .await?;
    Ok(member)
}

/// Inserts the membership, or updates the role of an existing one
pub async fn upsert_member<'e>(
    db: impl PgExecutor<'e>,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<TeamMember, DatabaseError> {
    let member = sqlx::query_as::<_, TeamMember>(&format!(
        "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, team_id) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE \
         RETURNING {MEMBER_COLUMNS}"
    ))
    .bind(team_id)
    .bind(user_id)
    .bind(role)
    .fetch_one(db)
    .await?;
    Ok(member)
}

pub async fn set_member_role<'e>(
    db: impl PgExecutor<'e>,
    member_id: Uuid,
    role: TeamRole,
) -> Result<TeamMember, DatabaseError> {
    let member = sqlx::query_as::<_, TeamMember>(&format!(
        "UPDATE team_members SET role = $2 WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
    ))
    .bind(member_id)
    .bind(role)
    .fetch_optional(db)
    .await?;
    member.ok_or_else(|| DatabaseError::NotFound("Team member not found".to_string()))
}

/// Sets every listed membership back to MEMBER
pub async fn demote<'e>(db: impl PgExecutor<'e>, member_ids: &[Uuid]) -> Result<u64, DatabaseError> {
    if member_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("UPDATE team_members SET role = 'MEMBER' WHERE id = ANY($1)")
        .bind(member_ids)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_members<'e>(db: impl PgExecutor<'e>, member_ids: &[Uuid]) -> Result<u64, DatabaseError> {
    if member_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("DELETE FROM team_members WHERE id = ANY($1)")
        .bind(member_ids)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
