#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use trainhub_api::cache::MemoryCache;
use trainhub_api::config::AppConfig;
use trainhub_api::testing::{MemoryStorage, RecordingMailer};
use trainhub_api::{router, AppState};

/// Router wired to in-process storage, cache and mailer.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
}

/// A verified company admin with a bearer token.
pub struct Admin {
    pub token: String,
    pub user_id: String,
    pub company_id: String,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let config = AppConfig::from_lookup(|key| match key {
            "SECURITY_BCRYPT_COST" => Some("4".to_string()),
            "REGISTRATION_TTL_SECS" => Some("60".to_string()),
            _ => None,
        });
        let storage = Arc::new(MemoryStorage::new());
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(
            &config,
            storage.clone(),
            Arc::new(MemoryCache::new()),
            mailer.clone(),
        )?;

        Ok(Self {
            router: router(state, &config),
            storage,
            mailer,
        })
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, value))
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    /// Stage a registration and return its key.
    pub async fn stage(&self, email: &str, password: &str, company: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "email": email, "password": password, "company_name": company }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::ACCEPTED, "register returned {status}: {body}");
        Ok(body["data"]["key"].as_str().context("missing key")?.to_string())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .post("/auth/login", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login returned {status}: {body}");
        Ok(body["data"]["token"].as_str().context("missing token")?.to_string())
    }

    /// Register, verify, and log in a new company admin.
    pub async fn admin(&self, email: &str, company: &str) -> Result<Admin> {
        let key = self.stage(email, "pw", company).await?;
        let code = self.mailer.last_code_for(email).context("no code mailed")?;
        let (status, body) = self
            .post("/auth/verify", None, json!({ "key": key, "code": code }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "verify returned {status}: {body}");

        Ok(Admin {
            token: self.login(email, "pw").await?,
            user_id: body["data"]["user"]["id"].as_str().context("missing user id")?.to_string(),
            company_id: body["data"]["company"]["id"]
                .as_str()
                .context("missing company id")?
                .to_string(),
        })
    }
}
