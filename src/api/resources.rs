use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{NewResource, ResourceDetail};
use crate::db::ResourceRepository;
use crate::error::AppError;

/// POST /api/resources
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewResource>,
) -> Result<Json<ResourceDetail>, AppError> {
    let resource = ResourceRepository::create(&state.db, &user.id, req).await?;
    Ok(Json(resource))
}

/// GET /api/resources/swap/:id
pub async fn list_for_swap(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(swap_session_id): Path<String>,
) -> Result<Json<Vec<ResourceDetail>>, AppError> {
    let resources =
        ResourceRepository::list_for_swap(&state.db, &user.id, &swap_session_id).await?;
    Ok(Json(resources))
}

/// DELETE /api/resources/:id (uploader or participant)
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(resource_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    ResourceRepository::delete(&state.db, &user.id, &resource_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
