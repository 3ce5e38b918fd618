mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use agency_api::database::models::Role;

#[tokio::test]
async fn api_without_session_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;

    for path in ["/api/projects", "/api/tasks", "/api/messages", "/api/users"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(res.json::<serde_json::Value>().await?, json!({ "error": "Unauthorized" }));
    }
    Ok(())
}

#[tokio::test]
async fn user_administration_is_admin_only() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;

    for role in [Role::Client, Role::TeamMember, Role::ProjectManager] {
        let res = client
            .get(server.url("/api/users"))
            .bearer_auth(common::token(role, true))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{role}");
    }
    Ok(())
}

#[tokio::test]
async fn deactivated_session_is_403_on_api() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .get(server.url("/api/projects"))
        .bearer_auth(common::token(Role::Admin, false))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn actions_recheck_roles_before_touching_data() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;
    let token = common::token(Role::TeamMember, true);

    let res = client
        .delete(server.url(&format!("/api/teams/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Unauthorized");

    let res = client
        .get(server.url("/api/invoices"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn session_endpoint_echoes_principal() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .get(server.url("/api/auth/session"))
        .bearer_auth(common::token(Role::ProjectManager, true))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["role"], "PROJECT_MANAGER");
    assert_eq!(body["data"]["is_active"], true);
    Ok(())
}

#[tokio::test]
async fn database_outage_surfaces_as_503() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .post(server.url("/auth/signin"))
        .json(&json!({ "email": "admin@agency.test", "password": "secret1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
