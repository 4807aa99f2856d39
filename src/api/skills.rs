use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{NewSkill, Skill, SkillWithOwner, UpdateSkill};
use crate::db::SkillRepository;
use crate::error::AppError;

/// GET /api/skills
pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<SkillWithOwner>>, AppError> {
    let skills = SkillRepository::list_all(&state.db).await?;
    Ok(Json(skills))
}

/// GET /api/skills/user/:id
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let skills = SkillRepository::list_for_user(&state.db, &user_id).await?;
    Ok(Json(skills))
}

/// POST /api/skills
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewSkill>,
) -> Result<Json<Skill>, AppError> {
    let skill = SkillRepository::create(&state.db, &user.id, req).await?;
    Ok(Json(skill))
}

/// PUT /api/skills/:id (owner only)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(skill_id): Path<String>,
    Json(req): Json<UpdateSkill>,
) -> Result<Json<Skill>, AppError> {
    let skill = SkillRepository::update(&state.db, &skill_id, &user.id, req).await?;
    Ok(Json(skill))
}

/// DELETE /api/skills/:id (owner only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(skill_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    SkillRepository::delete(&state.db, &skill_id, &user.id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
