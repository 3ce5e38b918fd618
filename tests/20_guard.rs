mod common;

use anyhow::Result;
use reqwest::StatusCode;

use agency_api::database::models::Role;

#[tokio::test]
async fn anonymous_dashboard_visit_redirects_to_signin() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?.get(server.url("/dashboard/client")).send().await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&res).as_deref(), Some("/auth/signin"));
    Ok(())
}

#[tokio::test]
async fn each_role_reaches_only_its_area() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;

    let cases = [
        (Role::Client, "/dashboard/client", true),
        (Role::Client, "/dashboard/team-member", false),
        (Role::TeamMember, "/dashboard/team-member/tasks", true),
        (Role::TeamMember, "/dashboard/project-manager", false),
        (Role::ProjectManager, "/dashboard/project-manager", true),
        (Role::ProjectManager, "/dashboard/team-member", true),
        (Role::ProjectManager, "/dashboard/admin", false),
        (Role::Admin, "/dashboard/client/projects", true),
    ];

    for (role, path, allowed) in cases {
        let res = client
            .get(server.url(path))
            .bearer_auth(common::token(role, true))
            .send()
            .await?;
        if allowed {
            assert_eq!(res.status(), StatusCode::OK, "{role} on {path}");
        } else {
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{role} on {path}");
            assert_eq!(common::location(&res).as_deref(), Some("/unauthorized"), "{role} on {path}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn deactivated_accounts_are_always_sent_to_signin() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::client()?;

    for role in Role::ALL {
        let res = client
            .get(server.url("/dashboard/admin"))
            .bearer_auth(common::token(role, false))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            common::location(&res).as_deref(),
            Some("/auth/signin?error=account-deactivated")
        );
    }
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .get(server.url("/dashboard"))
        .header(
            reqwest::header::COOKIE,
            format!("agency_session={}", common::token(Role::TeamMember, true)),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&res).as_deref(), Some("/dashboard/team-member"));
    Ok(())
}

#[tokio::test]
async fn tampered_token_is_anonymous() -> Result<()> {
    let server = common::ensure_server().await?;

    let mut token = common::token(Role::Admin, true);
    token.push('x');
    let res = common::client()?
        .get(server.url("/dashboard/admin"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&res).as_deref(), Some("/auth/signin"));
    Ok(())
}
