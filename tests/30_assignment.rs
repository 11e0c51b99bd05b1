mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{Admin, TestApp};

async fn position(app: &TestApp, admin: &Admin, name: &str) -> Result<String> {
    let (status, body) = app
        .post("/api/positions", Some(&admin.token), json!({ "name": name }))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "position returned {status}");
    Ok(body["data"]["id"].as_str().unwrap_or_default().to_string())
}

async fn course(app: &TestApp, admin: &Admin, name: &str) -> Result<String> {
    let (status, body) = app
        .post("/api/courses", Some(&admin.token), json!({ "name": name }))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "course returned {status}");
    Ok(body["data"]["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn double_assignment_conflicts_and_keeps_one_link() -> Result<()> {
    let app = TestApp::new()?;
    let admin = app.admin("a@x.com", "C1").await?;
    let p1 = position(&app, &admin, "P1").await?;
    let x = course(&app, &admin, "X").await?;
    let uri = format!("/api/positions/{p1}/courses");

    let (status, _) = app
        .post(&uri, Some(&admin.token), json!({ "course_ids": [x] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(&uri, Some(&admin.token), json!({ "course_ids": [x] }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "POSITION_COURSE_USED");

    let (status, body) = app.get(&uri, &admin.token).await?;
    assert_eq!(status, StatusCode::OK);
    let courses = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["id"], x.as_str());
    Ok(())
}

#[tokio::test]
async fn cross_company_assignment_is_unauthorized() -> Result<()> {
    let app = TestApp::new()?;
    let acme = app.admin("a@x.com", "Acme").await?;
    let globex = app.admin("b@y.com", "Globex").await?;
    let foreign_position = position(&app, &globex, "Clerk").await?;
    let own_course = course(&app, &acme, "Safety").await?;

    let (status, body) = app
        .post(
            &format!("/api/positions/{foreign_position}/courses"),
            Some(&acme.token),
            json!({ "course_ids": [own_course] }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (_, body) = app
        .get(&format!("/api/positions/{foreign_position}/courses"), &globex.token)
        .await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn empty_assignment_is_a_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    let admin = app.admin("a@x.com", "Acme").await?;
    let p1 = position(&app, &admin, "P1").await?;

    let (status, body) = app
        .post(
            &format!("/api/positions/{p1}/courses"),
            Some(&admin.token),
            json!({ "course_ids": [] }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_FIELD");
    Ok(())
}

#[tokio::test]
async fn user_position_assignment() -> Result<()> {
    let app = TestApp::new()?;
    let admin = app.admin("a@x.com", "Acme").await?;
    let p1 = position(&app, &admin, "P1").await?;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/position", admin.user_id),
            Some(&admin.token),
            Some(json!({ "position_id": p1 })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["position_id"], p1.as_str());

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/position", admin.user_id),
            Some(&admin.token),
            Some(json!({ "position_id": uuid_nil() })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

fn uuid_nil() -> &'static str {
    "00000000-0000-0000-0000-000000000000"
}
