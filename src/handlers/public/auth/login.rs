// handlers/public/auth/login.rs - POST /auth/login

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Session;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/**
 * POST /auth/login - Authenticate and receive a JWT
 *
 * Output:
 * ```json
 * { "success": true, "data": { "token": "eyJ...", "expires_in": 3600, "user": { ... } } }
 * ```
 */
pub async fn login_post(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Session> {
    let session = state.sessions.login(&body.email, &body.password).await?;
    Ok(ApiResponse::success(session))
}
