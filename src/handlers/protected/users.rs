// handlers/protected/users.rs - employee management

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::non_empty;
use crate::app::AppState;
use crate::database::models::User;
use crate::database::store::UserPatch;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::EmployeeRequest;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeBody {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub position_id: Option<Uuid>,
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPatchBody {
    pub name: Option<String>,
    pub leader_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PositionAssignBody {
    pub position_id: Uuid,
}

/// POST /api/users - admin creates an employee in their own company
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EmployeeBody>,
) -> ApiResult<User> {
    let user = state
        .catalog
        .create_employee(
            auth.user_id,
            EmployeeRequest {
                email: body.email,
                password: body.password,
                name: non_empty(body.name),
                position_id: body.position_id,
                leader_id: body.leader_id,
            },
        )
        .await?;
    Ok(ApiResponse::created(user))
}

/// PATCH /api/users/:id
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UserPatchBody>,
) -> ApiResult<User> {
    let patch = UserPatch {
        name: non_empty(body.name),
        leader_id: body.leader_id,
        is_active: body.is_active,
    };
    let user = state.catalog.edit_user(auth.user_id, user_id, patch).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/:id/position
pub async fn position_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<PositionAssignBody>,
) -> ApiResult<User> {
    let user = state
        .assignments
        .assign_position(auth.user_id, user_id, body.position_id)
        .await?;
    Ok(ApiResponse::success(user))
}
