// handlers/public/health.rs - GET /health

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// Liveness plus a storage round trip.
pub async fn health_get(State(state): State<AppState>) -> ApiResult<Value> {
    state.storage.health_check().await?;
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
