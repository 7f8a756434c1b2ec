mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use daycare_api::auth::{generate_jwt_with_secret, Claims};
use daycare_api::types::Role;

use common::assert_error;

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/api/children")).await?;

    assert_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn malformed_and_foreign_tokens_are_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/children"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.c".into(), &[Role::Admin], None, 1);
    let foreign = generate_jwt_with_secret(&claims, "some-other-secret")?;
    let res = client
        .get(server.url("/api/children"))
        .bearer_auth(foreign)
        .send()
        .await?;
    assert_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.c".into(), &[Role::Admin], None, -2);
    let expired = generate_jwt_with_secret(&claims, common::TEST_JWT_SECRET)?;

    let res = reqwest::Client::new()
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(expired)
        .send()
        .await?;
    assert_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn whoami_echoes_the_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let daycare = Uuid::new_v4();
    let token = common::token_for(&[Role::OfficeManager], Some(daycare))?;

    let res = reqwest::Client::new()
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["roles"], json!(["office_manager"]));
    assert_eq!(body["data"]["daycare_id"], json!(daycare));
    Ok(())
}

#[tokio::test]
async fn refresh_issues_a_working_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::token_for(&[Role::Responsible], Some(Uuid::new_v4()))?;

    let res = client
        .post(server.url("/api/auth/refresh"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["role"], "responsible");
    let renewed = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!renewed.is_empty());

    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(renewed)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn roles_gate_each_route_group() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let responsible = common::token_for(&[Role::Responsible], Some(Uuid::new_v4()))?;
    let manager = common::token_for(&[Role::OfficeManager], Some(Uuid::new_v4()))?;
    let admin = common::token_for(&[Role::Admin], None)?;

    // Responsibles cannot create daycares or enroll children
    let res = client
        .post(server.url("/api/daycares"))
        .bearer_auth(&responsible)
        .json(&json!({ "name": "Sunny Days" }))
        .send()
        .await?;
    assert_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    let res = client
        .get(server.url("/api/children"))
        .bearer_auth(&responsible)
        .send()
        .await?;
    assert_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    // Office managers may read daycares but not write them
    let res = client
        .delete(server.url(&format!("/api/daycares/{}", Uuid::new_v4())))
        .bearer_auth(&manager)
        .send()
        .await?;
    assert_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    let res = client
        .get(server.url("/api/office-managers"))
        .bearer_auth(&manager)
        .send()
        .await?;
    assert_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    // /api/me belongs to responsibles only
    let res = client.get(server.url("/api/me")).bearer_auth(&admin).send().await?;
    assert_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{\"email\": \"admin@daycare.example\", ")
        .send()
        .await?;
    assert_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;

    // Well-formed JSON missing a field
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "admin@daycare.example" }))
        .send()
        .await?;
    assert_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    Ok(())
}
