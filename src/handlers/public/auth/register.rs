// handlers/public/auth/register.rs - POST /auth/register and POST /auth/register/resend

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{StageRequest, StagedRegistration};

/// Missing fields deserialize empty and are reported by the service.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub company_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendBody {
    pub key: String,
}

/**
 * POST /auth/register - Stage a new company and its administrator
 *
 * Input: `{ "email", "password", "company_name" }`
 *
 * Responds 202 with `{ "key", "email_sent" }`. Nothing durable exists until
 * the code mailed to `email` is confirmed through POST /auth/verify.
 */
pub async fn register_post(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<StagedRegistration> {
    let staged = state
        .provisioning
        .stage(StageRequest {
            email: body.email,
            password: body.password,
            company_name: body.company_name,
        })
        .await?;
    Ok(ApiResponse::accepted(staged))
}

/// POST /auth/register/resend - Mail a fresh code for a staged registration
pub async fn resend_post(
    State(state): State<AppState>,
    Json(body): Json<ResendBody>,
) -> ApiResult<StagedRegistration> {
    let staged = state.provisioning.resend_code(&body.key).await?;
    Ok(ApiResponse::accepted(staged))
}
