use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    #[default]
    Member,
    Lead,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub team_lead_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Membership row joined with the member's display fields
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberRow {
    #[sqlx(flatten)]
    pub member: TeamMember,
    pub user_name: String,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub member_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub role: TeamRole,
}

impl From<&TeamMemberRow> for MemberSummary {
    fn from(row: &TeamMemberRow) -> Self {
        Self {
            member_id: row.member.id,
            user_id: row.member.user_id,
            name: row.user_name.clone(),
            avatar: row.user_avatar.clone(),
            role: row.member.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub member_count: usize,
    pub active_projects: i64,
    pub lead: Option<MemberSummary>,
    pub members: Vec<MemberSummary>,
}

impl TeamSummary {
    /// `rows` may contain members of other teams; only this team's are kept.
    pub fn build(team: Team, rows: &[TeamMemberRow], active_projects: i64) -> Self {
        let members: Vec<MemberSummary> = rows
            .iter()
            .filter(|row| row.member.team_id == team.id)
            .map(MemberSummary::from)
            .collect();
        let lead = members.iter().find(|m| m.role == TeamRole::Lead).cloned();

        Self {
            id: team.id,
            name: team.name,
            description: team.description,
            is_active: team.is_active,
            member_count: members.len(),
            active_projects,
            lead,
            members,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamChanges {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub team_lead_id: Option<Uuid>,
}

/// Membership rows that must step down before `promoted` becomes LEAD.
///
/// With the one-lead invariant intact this is at most one row. Passing `None`
/// covers a member that does not exist yet.
pub fn leads_to_demote(members: &[TeamMember], promoted: Option<Uuid>) -> Vec<Uuid> {
    members
        .iter()
        .filter(|m| m.role == TeamRole::Lead && Some(m.id) != promoted)
        .map(|m| m.id)
        .collect()
}

/// Changes needed to turn the current roster into `desired` users with `lead`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipPlan {
    /// Membership row ids to delete
    pub remove: Vec<Uuid>,
    /// (user id, role) pairs to upsert; MEMBER rows first, the LEAD row last
    pub upsert: Vec<(Uuid, TeamRole)>,
}

pub fn plan_membership(current: &[TeamMember], desired: &[Uuid], lead: Option<Uuid>) -> MembershipPlan {
    let mut seen = HashSet::new();
    let mut wanted: Vec<Uuid> = desired.iter().copied().filter(|id| seen.insert(*id)).collect();
    if let Some(lead_id) = lead {
        if seen.insert(lead_id) {
            wanted.push(lead_id);
        }
    }

    let remove = current
        .iter()
        .filter(|m| !seen.contains(&m.user_id))
        .map(|m| m.id)
        .collect();

    let mut upsert: Vec<(Uuid, TeamRole)> = wanted
        .into_iter()
        .filter(|id| Some(*id) != lead)
        .map(|id| (id, TeamRole::Member))
        .collect();
    if let Some(lead_id) = lead {
        upsert.push((lead_id, TeamRole::Lead));
    }

    MembershipPlan { remove, upsert }
}
