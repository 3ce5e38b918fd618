use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::ServiceError;
use crate::auth::Principal;
use crate::database::models::team::{
    leads_to_demote, plan_membership, Team, TeamChanges, TeamMember, TeamRole, TeamSummary,
};
use crate::database::models::user::SelectOption;
use crate::database::models::{ProjectStatus, Role};
use crate::database::repositories::{projects, teams as repo, users};
use crate::rbac::require_role;

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TeamRequest {
    #[validate(length(min = 2, message = "Team name must be at least 2 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "active_by_default")]
    pub is_active: bool,

    /// User ids; the lead is added when missing
    #[serde(default)]
    pub members: Vec<Uuid>,

    pub team_lead_id: Option<Uuid>,
}

impl TeamRequest {
    fn changes(&self) -> TeamChanges {
        TeamChanges {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            team_lead_id: self.team_lead_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberRoleRequest {
    pub role: TeamRole,
}

/// Open project count per team
pub fn active_project_counts(statuses: &[(Uuid, ProjectStatus)]) -> HashMap<Uuid, i64> {
    let mut counts = HashMap::new();
    for (team_id, status) in statuses {
        if !status.is_closed() {
            *counts.entry(*team_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Team administration. Every action is ADMIN only.
///
/// Anything that can change who leads a team runs in one transaction that
/// starts by locking the team row, so concurrent lead changes on the same team
/// queue up behind each other. The partial unique index on LEAD rows is the
/// backstop if that ever fails.
#[derive(Clone)]
pub struct TeamService {
    pool: PgPool,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<TeamSummary>, ServiceError> {
        require_role(principal, Role::Admin)?;
        let (teams, rows, statuses) = futures::try_join!(
            repo::list(&self.pool),
            repo::member_rows(&self.pool, None),
            projects::team_statuses(&self.pool, None),
        )?;

        let open = active_project_counts(&statuses);
        Ok(teams
            .into_iter()
            .map(|team| {
                let active = open.get(&team.id).copied().unwrap_or(0);
                TeamSummary::build(team, &rows, active)
            })
            .collect())
    }

    pub async fn create(&self, principal: &Principal, request: TeamRequest) -> Result<TeamSummary, ServiceError> {
        require_role(principal, Role::Admin)?;
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        let team = repo::insert(&mut *tx, &request.changes()).await?;
        let plan = plan_membership(&[], &request.members, request.team_lead_id);
        for (user_id, role) in &plan.upsert {
            repo::upsert_member(&mut *tx, team.id, *user_id, *role).await?;
        }
        let summary = summarize(&mut tx, team).await?;
        tx.commit().await?;

        info!("Team '{}' created by {} with {} members", summary.name, principal.email, summary.member_count);
        Ok(summary)
    }

    /// Replaces the roster with `request.members` and the lead
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: TeamRequest,
    ) -> Result<TeamSummary, ServiceError> {
        require_role(principal, Role::Admin)?;
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        repo::lock(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team"))?;

        let current = repo::members_of(&mut *tx, id).await?;
        let plan = plan_membership(&current, &request.members, request.team_lead_id);
        repo::delete_members(&mut *tx, &plan.remove).await?;
        for (user_id, role) in &plan.upsert {
            repo::upsert_member(&mut *tx, id, *user_id, *role).await?;
        }

        let team = repo::update(&mut *tx, id, &request.changes())
            .await?
            .ok_or_else(|| ServiceError::not_found("Team"))?;
        let summary = summarize(&mut tx, team).await?;
        tx.commit().await?;

        info!("Team '{}' updated by {}", summary.name, principal.email);
        Ok(summary)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_role(principal, Role::Admin)?;
        if !repo::delete(&self.pool, id).await? {
            return Err(ServiceError::not_found("Team"));
        }
        info!("Team {} deleted by {}", id, principal.email);
        Ok(())
    }

    /// Adds `user_id`, or changes their role when already on the team.
    /// Joining as LEAD demotes the previous lead.
    pub async fn add_member(
        &self,
        principal: &Principal,
        team_id: Uuid,
        request: AddMemberRequest,
    ) -> Result<TeamMember, ServiceError> {
        require_role(principal, Role::Admin)?;

        let mut tx = self.pool.begin().await?;
        let team = repo::lock(&mut *tx, team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team"))?;

        if request.role == TeamRole::Lead {
            let members = repo::members_of(&mut *tx, team_id).await?;
            let existing = members.iter().find(|m| m.user_id == request.user_id).map(|m| m.id);
            repo::demote(&mut *tx, &leads_to_demote(&members, existing)).await?;
        }
        let member = repo::upsert_member(&mut *tx, team_id, request.user_id, request.role).await?;
        sync_lead(&mut tx, &team, &member).await?;
        tx.commit().await?;

        info!(
            "User {} joined team '{}' as {:?} (by {})",
            member.user_id, team.name, member.role, principal.email
        );
        Ok(member)
    }

    pub async fn update_member_role(
        &self,
        principal: &Principal,
        team_id: Uuid,
        member_id: Uuid,
        request: MemberRoleRequest,
    ) -> Result<TeamMember, ServiceError> {
        require_role(principal, Role::Admin)?;

        let mut tx = self.pool.begin().await?;
        let team = repo::lock(&mut *tx, team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team"))?;
        repo::find_member(&mut *tx, team_id, member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team member"))?;

        if request.role == TeamRole::Lead {
            let members = repo::members_of(&mut *tx, team_id).await?;
            repo::demote(&mut *tx, &leads_to_demote(&members, Some(member_id))).await?;
        }
        let member = repo::set_member_role(&mut *tx, member_id, request.role).await?;
        sync_lead(&mut tx, &team, &member).await?;
        tx.commit().await?;

        info!("Member {} of team '{}' is now {:?}", member_id, team.name, member.role);
        Ok(member)
    }

    pub async fn remove_member(&self, principal: &Principal, team_id: Uuid, member_id: Uuid) -> Result<(), ServiceError> {
        require_role(principal, Role::Admin)?;

        let mut tx = self.pool.begin().await?;
        let team = repo::lock(&mut *tx, team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team"))?;
        let member = repo::find_member(&mut *tx, team_id, member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team member"))?;

        repo::delete_members(&mut *tx, &[member.id]).await?;
        if team.team_lead_id == Some(member.user_id) {
            repo::set_lead(&mut *tx, team_id, None).await?;
        }
        tx.commit().await?;

        info!("User {} removed from team '{}' by {}", member.user_id, team.name, principal.email);
        Ok(())
    }

    /// Users who can be placed on a team
    pub async fn member_options(&self, principal: &Principal) -> Result<Vec<SelectOption>, ServiceError> {
        require_role(principal, Role::Admin)?;
        Ok(users::team_member_options(&self.pool).await?)
    }
}

/// Keeps `teams.team_lead_id` in step with the membership row just written
async fn sync_lead(conn: &mut PgConnection, team: &Team, member: &TeamMember) -> Result<(), ServiceError> {
    match member.role {
        TeamRole::Lead if team.team_lead_id != Some(member.user_id) => {
            repo::set_lead(&mut *conn, team.id, Some(member.user_id)).await?;
        }
        TeamRole::Member if team.team_lead_id == Some(member.user_id) => {
            repo::set_lead(&mut *conn, team.id, None).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn summarize(conn: &mut PgConnection, team: Team) -> Result<TeamSummary, ServiceError> {
    let rows = repo::member_rows(&mut *conn, Some(team.id)).await?;
    let statuses = projects::team_statuses(&mut *conn, Some(team.id)).await?;
    let active = active_project_counts(&statuses).get(&team.id).copied().unwrap_or(0);
    Ok(TeamSummary::build(team, &rows, active))
}
