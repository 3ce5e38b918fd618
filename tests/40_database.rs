// Service actions against a live Postgres.
//
// Set TEST_DATABASE_URL to a disposable database to run these; without it each
// test logs a skip and passes. Fixtures use fresh emails so runs can share a
// database, and each test removes what it created.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use agency_api::auth::Principal;
use agency_api::config::DatabaseConfig;
use agency_api::database::models::{ProjectStatus, Role, TeamRole};
use agency_api::database::DatabaseManager;
use agency_api::services::messages::CreateMessageRequest;
use agency_api::services::projects::ProjectRequest;
use agency_api::services::teams::{AddMemberRequest, MemberRoleRequest, TeamRequest};
use agency_api::services::users::CreateUserRequest;
use agency_api::services::{MessageService, ProjectService, ServiceError, TeamService, UserService};

struct Fixture {
    db: DatabaseManager,
    admin: Principal,
    users: Vec<Uuid>,
    projects: Vec<Uuid>,
    teams: Vec<Uuid>,
}

impl Fixture {
    /// None when no test database is configured
    async fn connect() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return Ok(None);
        };
        let db = DatabaseManager::connect_lazy(&DatabaseConfig {
            url,
            max_connections: 10,
            connection_timeout: 5,
            run_migrations: true,
        })?;
        db.migrate().await?;

        // The acting admin never needs a row; fixtures created by it do
        let admin = Principal {
            id: Uuid::new_v4(),
            email: "admin@agency.test".to_string(),
            name: "Test Admin".to_string(),
            role: Role::Admin,
            is_active: true,
        };
        Ok(Some(Self { db, admin, users: Vec::new(), projects: Vec::new(), teams: Vec::new() }))
    }

    fn pool(&self) -> sqlx::PgPool {
        self.db.pool().clone()
    }

    async fn user(&mut self, role: Role) -> Result<Principal> {
        let name = format!("Fixture {}", role.as_str().to_lowercase());
        let user = UserService::new(self.pool())
            .create(
                &self.admin,
                CreateUserRequest {
                    name: name.clone(),
                    email: format!("fixture-{}@agency.test", Uuid::new_v4().simple()),
                    password: "secret1".to_string(),
                    role,
                    phone: None,
                    timezone: "UTC".to_string(),
                },
            )
            .await?;
        self.users.push(user.id);
        Ok(Principal { id: user.id, email: user.email, name, role, is_active: true })
    }

    async fn team(&mut self, members: Vec<Uuid>, lead: Option<Uuid>) -> Result<Uuid> {
        let team = TeamService::new(self.pool())
            .create(&self.admin, team_request(members, lead, true))
            .await?;
        self.teams.push(team.id);
        Ok(team.id)
    }

    async fn project(&mut self, client: Uuid, manager: Uuid, team: Option<Uuid>) -> Result<Uuid> {
        let project = ProjectService::new(self.pool())
            .create(&self.admin, project_request(client, manager, team, ProjectStatus::InProgress))
            .await?;
        self.projects.push(project.id);
        Ok(project.id)
    }

    async fn lead_count(&self, team_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND role = 'LEAD'")
            .bind(team_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn team_lead_id(&self, team_id: Uuid) -> Result<Option<Uuid>> {
        let lead: Option<Uuid> = sqlx::query_scalar("SELECT team_lead_id FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(lead)
    }

    async fn cleanup(self) -> Result<()> {
        let pool = self.db.pool();
        sqlx::query("DELETE FROM projects WHERE id = ANY($1)").bind(self.projects.as_slice()).execute(pool).await?;
        sqlx::query("DELETE FROM teams WHERE id = ANY($1)").bind(self.teams.as_slice()).execute(pool).await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)").bind(self.users.as_slice()).execute(pool).await?;
        self.db.close().await;
        Ok(())
    }
}

fn team_request(members: Vec<Uuid>, lead: Option<Uuid>, is_active: bool) -> TeamRequest {
    TeamRequest {
        name: "Fixture team".to_string(),
        description: None,
        is_active,
        members,
        team_lead_id: lead,
    }
}

fn project_request(client: Uuid, manager: Uuid, team: Option<Uuid>, status: ProjectStatus) -> ProjectRequest {
    ProjectRequest {
        name: "Fixture project".to_string(),
        description: "Created by the database tests".to_string(),
        status,
        priority: Default::default(),
        budget: Decimal::new(150_000, 2),
        due_date: Utc::now() + Duration::days(30),
        client_id: client,
        manager_id: manager,
        team_id: team,
    }
}

fn message(content: &str, recipient: Option<Uuid>, parent: Option<Uuid>) -> CreateMessageRequest {
    CreateMessageRequest {
        content: content.to_string(),
        recipient_id: recipient,
        project_id: None,
        priority: Default::default(),
        parent_id: parent,
    }
}

#[tokio::test]
async fn team_keeps_a_single_lead_through_every_action() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let (a, b, c) = (
        fx.user(Role::TeamMember).await?,
        fx.user(Role::TeamMember).await?,
        fx.user(Role::ProjectManager).await?,
    );
    let teams = TeamService::new(fx.pool());

    let team_id = fx.team(vec![a.id, b.id], Some(a.id)).await?;
    assert_eq!(fx.lead_count(team_id).await?, 1);
    assert_eq!(fx.team_lead_id(team_id).await?, Some(a.id));

    // Roster update hands the lead to b
    let summary = teams
        .update(&fx.admin, team_id, team_request(vec![a.id, b.id], Some(b.id), true))
        .await?;
    assert_eq!(summary.lead.as_ref().map(|l| l.user_id), Some(b.id));
    assert_eq!(fx.lead_count(team_id).await?, 1);

    // A new member joining as lead demotes b
    let joined = teams
        .add_member(&fx.admin, team_id, AddMemberRequest { user_id: c.id, role: TeamRole::Lead })
        .await?;
    assert_eq!(joined.role, TeamRole::Lead);
    assert_eq!(fx.lead_count(team_id).await?, 1);
    assert_eq!(fx.team_lead_id(team_id).await?, Some(c.id));

    // Promoting an existing member row demotes c
    let member_a = summary
        .members
        .iter()
        .find(|m| m.user_id == a.id)
        .map(|m| m.member_id)
        .context("a is on the roster")?;
    let promoted = teams
        .update_member_role(&fx.admin, team_id, member_a, MemberRoleRequest { role: TeamRole::Lead })
        .await?;
    assert_eq!(promoted.user_id, a.id);
    assert_eq!(fx.lead_count(team_id).await?, 1);
    assert_eq!(fx.team_lead_id(team_id).await?, Some(a.id));

    fx.cleanup().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lead_promotions_leave_one_lead() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let mut candidates = Vec::new();
    for _ in 0..4 {
        candidates.push(fx.user(Role::TeamMember).await?.id);
    }
    let team_id = fx.team(candidates.clone(), None).await?;

    let teams = TeamService::new(fx.pool());
    let admin = fx.admin.clone();
    let promotions = candidates.iter().map(|user_id| {
        let (teams, admin, user_id) = (teams.clone(), admin.clone(), *user_id);
        tokio::spawn(async move {
            teams
                .add_member(&admin, team_id, AddMemberRequest { user_id, role: TeamRole::Lead })
                .await
        })
    });
    for outcome in futures::future::join_all(promotions).await {
        outcome.context("promotion task panicked")??;
    }

    assert_eq!(fx.lead_count(team_id).await?, 1);
    let lead = fx.team_lead_id(team_id).await?.context("team has no lead")?;
    assert!(candidates.contains(&lead));

    fx.cleanup().await
}

#[tokio::test]
async fn threads_are_scoped_to_their_participants() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let (manager, client, outsider) = (
        fx.user(Role::ProjectManager).await?,
        fx.user(Role::Client).await?,
        fx.user(Role::TeamMember).await?,
    );
    let messages = MessageService::new(fx.pool());

    let root = messages.create(&manager, message("Kickoff on Monday", Some(client.id), None)).await?;
    let reply = messages.create(&client, message("Works for me", None, Some(root.id))).await?;
    assert_eq!(reply.recipient_id, Some(manager.id));
    messages.create(&manager, message("See you there", None, Some(reply.id))).await?;
    let side = messages.create(&manager, message("Internal note", Some(outsider.id), None)).await?;

    let threads = messages.list(&client).await?;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].message.id, root.id);
    assert_eq!(threads[0].reply_count, 2);
    assert_eq!(threads[0].replies[0].replies.len(), 1);

    let outsider_view = messages.list(&outsider).await?;
    assert_eq!(outsider_view.iter().map(|t| t.message.id).collect::<Vec<_>>(), vec![side.id]);

    // Replying into a thread the caller cannot see is refused
    let err = messages
        .create(&outsider, message("Let me in", None, Some(root.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized));

    let all = messages.list(&fx.admin).await?;
    assert!(all.iter().any(|t| t.message.id == root.id));
    assert!(all.iter().any(|t| t.message.id == side.id));

    fx.cleanup().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_mark_read_calls_agree_on_read_at() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let (manager, client) = (fx.user(Role::ProjectManager).await?, fx.user(Role::Client).await?);
    let messages = MessageService::new(fx.pool());
    let sent = messages.create(&manager, message("Invoice attached", Some(client.id), None)).await?;

    // The sender is not the recipient
    let err = messages.mark_read(&manager, sent.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized));

    let calls = (0..8).map(|_| {
        let (messages, client) = (messages.clone(), client.clone());
        tokio::spawn(async move { messages.mark_read(&client, sent.id).await })
    });
    let mut stamps = Vec::new();
    for outcome in futures::future::join_all(calls).await {
        let read = outcome.context("mark-read task panicked")??;
        assert!(read.read);
        stamps.push(read.read_at.context("read message without read_at")?);
    }
    stamps.dedup();
    assert_eq!(stamps.len(), 1, "every caller sees the first read_at");

    let again = messages.mark_read(&client, sent.id).await?;
    assert_eq!(again.read_at, Some(stamps[0]));

    fx.cleanup().await
}

#[tokio::test]
async fn deletion_guard_counts_real_associations() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let (client, manager, idle) = (
        fx.user(Role::Client).await?,
        fx.user(Role::ProjectManager).await?,
        fx.user(Role::TeamMember).await?,
    );
    fx.project(client.id, manager.id, None).await?;
    let users = UserService::new(fx.pool());

    let own = users.delete(&fx.admin, fx.admin.id).await.unwrap_err();
    assert_eq!(own.to_string(), "Cannot delete your own account");
    let not_admin = users.delete(&client, idle.id).await.unwrap_err();
    assert!(matches!(not_admin, ServiceError::Unauthorized));

    for pinned in [client.id, manager.id] {
        let err = users.delete(&fx.admin, pinned).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete user with associated projects, invoices, or tasks");
    }

    users.delete(&fx.admin, idle.id).await?;
    let gone = users.get(&fx.admin, idle.id).await.unwrap_err();
    assert!(matches!(gone, ServiceError::NotFound(_)));

    fx.cleanup().await
}

#[tokio::test]
async fn project_listing_follows_role_and_team_state() -> Result<()> {
    let Some(mut fx) = Fixture::connect().await? else { return Ok(()) };
    let (client, other_client) = (fx.user(Role::Client).await?, fx.user(Role::Client).await?);
    let (manager, other_manager) = (fx.user(Role::ProjectManager).await?, fx.user(Role::ProjectManager).await?);
    let member = fx.user(Role::TeamMember).await?;

    let active_team = fx.team(vec![member.id], None).await?;
    let retired_team = fx.team(vec![member.id], None).await?;
    let live = fx.project(client.id, manager.id, Some(active_team)).await?;
    let shelved = fx.project(other_client.id, other_manager.id, Some(retired_team)).await?;

    let projects = ProjectService::new(fx.pool());
    let teams = TeamService::new(fx.pool());
    let ids = |list: Vec<agency_api::database::models::project::ProjectListing>| {
        list.into_iter().map(|p| p.project.id).collect::<Vec<_>>()
    };

    assert_eq!(ids(projects.list(&client).await?), vec![live]);
    assert_eq!(ids(projects.list(&other_manager).await?), vec![shelved]);
    let mut member_view = ids(projects.list(&member).await?);
    member_view.sort();
    let mut both = vec![live, shelved];
    both.sort();
    assert_eq!(member_view, both);

    // Membership stays, but the team itself is switched off
    let retired = teams
        .update(&fx.admin, retired_team, team_request(vec![member.id], None, false))
        .await?;
    assert!(!retired.is_active);
    assert_eq!(ids(projects.list(&member).await?), vec![live]);

    let everything = ids(projects.list(&fx.admin).await?);
    assert!(everything.contains(&live) && everything.contains(&shelved));

    // Team summaries count only this team's open projects
    let summary = teams.update(&fx.admin, active_team, team_request(vec![member.id], None, true)).await?;
    assert_eq!(summary.active_projects, 1);
    projects
        .update(&manager, live, project_request(client.id, manager.id, Some(active_team), ProjectStatus::Completed))
        .await?;
    let summary = teams.update(&fx.admin, active_team, team_request(vec![member.id], None, true)).await?;
    assert_eq!(summary.active_projects, 0);

    fx.cleanup().await
}
