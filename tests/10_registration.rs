mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use trainhub_api::services::provisioning::MAX_VERIFY_ATTEMPTS;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_verify_creates_company_and_admin() -> Result<()> {
    let app = TestApp::new()?;
    let key = app.stage("a@x.com", "pw", "Acme").await?;
    assert_eq!(app.storage.user_count(), 0);

    let code = app.mailer.last_code_for("a@x.com").expect("code mailed");
    let (status, body) = app
        .post("/auth/verify", None, json!({ "key": key, "code": code }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["company"]["name"], "Acme");
    assert_eq!(body["data"]["user"]["email"], "a@x.com");
    assert_eq!(body["data"]["user"]["is_admin"], true);
    assert!(body["data"]["user"].get("password_hash").is_none());

    // The pending record is gone
    let (status, body) = app
        .post("/auth/verify", None, json!({ "key": key, "code": code }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    assert_eq!(app.storage.company_count(), 1);
    assert_eq!(app.storage.user_count(), 1);
    Ok(())
}

#[tokio::test]
async fn wrong_code_is_unauthorized() -> Result<()> {
    let app = TestApp::new()?;
    let key = app.stage("a@x.com", "pw", "Acme").await?;
    let code = app.mailer.last_code_for("a@x.com").expect("code mailed");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let (status, _) = app
        .post("/auth/verify", None, json!({ "key": key, "code": wrong }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/auth/verify", None, json!({ "key": key, "code": code }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn repeated_wrong_codes_discard_the_registration() -> Result<()> {
    let app = TestApp::new()?;
    let key = app.stage("a@x.com", "pw", "Acme").await?;
    let code = app.mailer.last_code_for("a@x.com").expect("code mailed");
    let n: u32 = code.parse()?;

    for offset in 1..=MAX_VERIFY_ATTEMPTS {
        let wrong = format!("{:06}", (n + offset) % 1_000_000);
        let (status, _) = app
            .post("/auth/verify", None, json!({ "key": key, "code": wrong }))
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = app
        .post("/auth/verify", None, json!({ "key": key, "code": code }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.storage.user_count(), 0);
    Ok(())
}

#[tokio::test]
async fn registering_a_taken_email_conflicts() -> Result<()> {
    let app = TestApp::new()?;
    app.admin("a@x.com", "Acme").await?;

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "email": "A@x.com", "password": "pw", "company_name": "Other" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_ALREADY_EXISTS");
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_bad_requests() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app
        .post("/auth/register", None, json!({ "email": "a@x.com", "password": "pw" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_FIELD");
    assert_eq!(app.mailer.sent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn resend_mails_a_new_code() -> Result<()> {
    let app = TestApp::new()?;
    let key = app.stage("a@x.com", "pw", "Acme").await?;

    let (status, body) = app
        .post("/auth/register/resend", None, json!({ "key": key }))
        .await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["email_sent"], true);
    assert_eq!(app.mailer.sent_count(), 2);

    let (status, _) = app
        .post("/auth/register/resend", None, json!({ "key": "unknown" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_password_and_protects_api() -> Result<()> {
    let app = TestApp::new()?;
    let admin = app.admin("a@x.com", "Acme").await?;

    let (status, body) = app
        .post("/auth/login", None, json!({ "email": "a@x.com", "password": "nope" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/api/positions", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/positions", "garbage").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/positions", &admin.token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
