// handlers/protected/positions.rs - /api/positions and position course assignment

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Course, Position};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PositionBody {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignBody {
    pub course_ids: Vec<Uuid>,
}

/// GET /api/positions - positions of the caller's company, by name
pub async fn list_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Position>> {
    let positions = state.catalog.list_positions(auth.user_id).await?;
    Ok(ApiResponse::success(positions))
}

/// POST /api/positions - admin only
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<PositionBody>,
) -> ApiResult<Position> {
    let position = state.catalog.create_position(auth.user_id, &body.name).await?;
    Ok(ApiResponse::created(position))
}

/// GET /api/positions/:id/courses
pub async fn courses_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(position_id): Path<Uuid>,
) -> ApiResult<Vec<Course>> {
    let courses = state.assignments.position_courses(auth.user_id, position_id).await?;
    Ok(ApiResponse::success(courses))
}

/**
 * POST /api/positions/:id/courses - assign courses to a position
 *
 * Input: `{ "course_ids": ["uuid", ...] }`. All links are created or none.
 * A course already linked to the position answers 409 POSITION_COURSE_USED.
 * Responds 201 with the position's full course list.
 */
pub async fn courses_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(position_id): Path<Uuid>,
    Json(body): Json<AssignBody>,
) -> ApiResult<Vec<Course>> {
    state
        .assignments
        .assign_courses(auth.user_id, position_id, &body.course_ids)
        .await?;
    let courses = state.assignments.position_courses(auth.user_id, position_id).await?;
    Ok(ApiResponse::created(courses))
}
