mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use daycare_api::types::Role;

use common::assert_error;

/// Enrollment body with every field valid; tests knock fields out of it
fn enrollment() -> Value {
    json!({
        "first_name": "Noah",
        "last_name": "Roy",
        "birth_date": "2022-01-01",
        "gender": "male",
        "responsible_id": Uuid::new_v4(),
        "relationship": "father",
    })
}

async fn enroll(body: &Value) -> Result<reqwest::Response> {
    let server = common::ensure_server().await?;
    let admin = common::token_for(&[Role::Admin], None)?;
    Ok(reqwest::Client::new()
        .post(server.url("/api/children"))
        .bearer_auth(admin)
        .json(body)
        .send()
        .await?)
}

#[tokio::test]
async fn missing_relationship_is_a_field_error() -> Result<()> {
    let mut body = enrollment();
    body.as_object_mut().unwrap().remove("relationship");

    let body = assert_error(enroll(&body).await?, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["relationship"].is_string(), "unexpected body: {}", body);
    Ok(())
}

#[tokio::test]
async fn numeric_birth_date_is_a_field_error() -> Result<()> {
    let mut body = enrollment();
    body["birth_date"] = json!(20220101);

    let body = assert_error(enroll(&body).await?, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["birth_date"].is_string(), "unexpected body: {}", body);
    Ok(())
}

#[tokio::test]
async fn blank_responsible_is_a_field_error() -> Result<()> {
    let mut body = enrollment();
    body["responsible_id"] = json!("  ");

    let body = assert_error(enroll(&body).await?, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["responsible_id"].is_string(), "unexpected body: {}", body);
    Ok(())
}

#[tokio::test]
async fn undecodable_bodies_use_the_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let admin = common::token_for(&[Role::Admin], None)?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/children"))
        .bearer_auth(&admin)
        .header("content-type", "application/json")
        .body("{\"first_name\": ")
        .send()
        .await?;
    assert_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;

    // first_name is a required string
    let mut body = enrollment();
    body["first_name"] = json!(7);
    assert_error(enroll(&body).await?, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    let res = client
        .post(server.url("/api/children"))
        .bearer_auth(&admin)
        .body(enrollment().to_string())
        .send()
        .await?;
    assert_error(res, StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE").await?;

    let res = client
        .post(server.url("/api/daycares"))
        .bearer_auth(&admin)
        .json(&json!({ "address": "no name" }))
        .send()
        .await?;
    assert_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    Ok(())
}
