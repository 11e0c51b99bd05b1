// handlers/protected/lessons.rs - course lessons and the caller's lesson feed

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::non_empty;
use crate::app::AppState;
use crate::database::models::Lesson;
use crate::database::store::LessonPatch;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::LessonRequest;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LessonBody {
    pub name: String,
    pub description: String,
    pub content: String,
    pub ordinal: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LessonPatchBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub ordinal: Option<i32>,
}

impl From<LessonPatchBody> for LessonPatch {
    fn from(body: LessonPatchBody) -> Self {
        Self {
            name: non_empty(body.name),
            description: non_empty(body.description),
            content: non_empty(body.content),
            ordinal: body.ordinal,
        }
    }
}

/// GET /api/courses/:id/lessons - ordered by ordinal
pub async fn list_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Vec<Lesson>> {
    let lessons = state.catalog.list_lessons(auth.user_id, course_id).await?;
    Ok(ApiResponse::success(lessons))
}

/// POST /api/courses/:id/lessons - admin only
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    Json(body): Json<LessonBody>,
) -> ApiResult<Lesson> {
    let lesson = state
        .catalog
        .create_lesson(
            auth.user_id,
            course_id,
            LessonRequest {
                name: body.name,
                description: body.description,
                content: body.content,
                ordinal: body.ordinal,
            },
        )
        .await?;
    Ok(ApiResponse::created(lesson))
}

/// PATCH /api/lessons/:id
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<LessonPatchBody>,
) -> ApiResult<Lesson> {
    let lesson = state
        .catalog
        .edit_lesson(auth.user_id, lesson_id, body.into())
        .await?;
    Ok(ApiResponse::success(lesson))
}

/// GET /api/me/lessons - lessons of every course linked to the caller's position
pub async fn mine_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Lesson>> {
    let lessons = state.catalog.my_lessons(auth.user_id).await?;
    Ok(ApiResponse::success(lessons))
}
