mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_reports_database_state() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?.get(server.url("/health")).send().await?;

    // The test database is unreachable; a live one would answer 200
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("success").is_some() || body.get("error").is_some());
    Ok(())
}

#[tokio::test]
async fn landing_page_is_public() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["signin"], "/auth/signin");
    Ok(())
}

#[tokio::test]
async fn signin_page_echoes_error_code() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .get(server.url("/auth/signin?error=account-deactivated"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["error"]["message"], "Account is deactivated");
    Ok(())
}

#[tokio::test]
async fn signin_rejects_malformed_body() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()?
        .post(server.url("/auth/signin"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"email\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
