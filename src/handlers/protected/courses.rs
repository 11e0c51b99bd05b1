// handlers/protected/courses.rs - /api/courses

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::non_empty;
use crate::app::AppState;
use crate::database::models::Course;
use crate::database::store::CoursePatch;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourseBody {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoursePatchBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<CoursePatchBody> for CoursePatch {
    fn from(body: CoursePatchBody) -> Self {
        Self {
            name: non_empty(body.name),
            description: non_empty(body.description),
            is_active: body.is_active,
        }
    }
}

/// GET /api/courses - courses created inside the caller's company
pub async fn list_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Course>> {
    let courses = state.catalog.list_courses(auth.user_id).await?;
    Ok(ApiResponse::success(courses))
}

/// POST /api/courses - admin only; the caller becomes the creator
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CourseBody>,
) -> ApiResult<Course> {
    let course = state
        .catalog
        .create_course(auth.user_id, &body.name, &body.description)
        .await?;
    Ok(ApiResponse::created(course))
}

/// PATCH /api/courses/:id - absent or empty fields keep their stored value
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    Json(body): Json<CoursePatchBody>,
) -> ApiResult<Course> {
    let course = state
        .catalog
        .edit_course(auth.user_id, course_id, body.into())
        .await?;
    Ok(ApiResponse::success(course))
}
