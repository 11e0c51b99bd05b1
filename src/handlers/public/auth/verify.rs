// handlers/public/auth/verify.rs - POST /auth/verify

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Promotion;

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub key: String,
    pub code: String,
}

/**
 * POST /auth/verify - Confirm a staged registration
 *
 * Input: `{ "key", "code" }`
 *
 * Responds 201 with the new `company` and admin `user`. The staged record is
 * consumed; verifying the same key again yields 404.
 */
pub async fn verify_post(
    State(state): State<AppState>,
    Json(body): Json<VerifyBody>,
) -> ApiResult<Promotion> {
    let promotion = state.provisioning.verify(&body.key, body.code.trim()).await?;
    Ok(ApiResponse::created(promotion))
}
