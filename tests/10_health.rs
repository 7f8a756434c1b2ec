mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/")).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Daycare API");
    assert!(body["data"]["endpoints"]["children"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_missing_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/health")).await?;

    // The test server runs without DATABASE_URL
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/api/nope")).await?;

    // Unmatched paths never reach the JWT layer
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn server_stops_when_its_parent_goes_away() -> Result<()> {
    let server = common::TestServer::start_private().await?;
    let url = server.url("/");

    let status = server.close_stdin_and_wait(std::time::Duration::from_secs(10)).await?;
    assert!(status.success(), "server exited with {}", status);
    assert!(reqwest::get(url).await.is_err());
    Ok(())
}
