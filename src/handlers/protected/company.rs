// handlers/protected/company.rs - PATCH /api/company

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use super::non_empty;
use crate::app::AppState;
use crate::database::models::Company;
use crate::database::store::CompanyPatch;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompanyPatchBody {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Edits the caller's own company. Admin only.
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CompanyPatchBody>,
) -> ApiResult<Company> {
    let patch = CompanyPatch {
        name: non_empty(body.name),
        is_active: body.is_active,
    };
    let company = state.catalog.edit_company(auth.user_id, patch).await?;
    Ok(ApiResponse::success(company))
}
