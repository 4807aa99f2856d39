use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::UserProfile;
use crate::db::UserRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserRepository::profile(&state.db, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// PUT /api/users/:id - self or admin only
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if actor.id != user_id && !actor.is_admin {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let profile =
        UserRepository::update_profile(&state.db, &user_id, req.full_name, req.bio).await?;

    Ok(Json(profile))
}
