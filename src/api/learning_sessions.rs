use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{
    LearningSession, LearningSessionDetail, NewLearningSession, UpdateLearningSession,
};
use crate::db::LearningSessionRepository;
use crate::error::AppError;

/// POST /api/learning-sessions
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewLearningSession>,
) -> Result<Json<LearningSession>, AppError> {
    let lesson = LearningSessionRepository::create(&state.db, &user.id, req).await?;
    Ok(Json(lesson))
}

/// GET /api/learning-sessions/swap/:id
pub async fn list_for_swap(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(swap_session_id): Path<String>,
) -> Result<Json<Vec<LearningSessionDetail>>, AppError> {
    let lessons =
        LearningSessionRepository::list_for_swap(&state.db, &user.id, &swap_session_id).await?;
    Ok(Json(lessons))
}

/// PUT /api/learning-sessions/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
    Json(req): Json<UpdateLearningSession>,
) -> Result<Json<LearningSession>, AppError> {
    let lesson = LearningSessionRepository::update(&state.db, &user.id, &lesson_id, req).await?;
    Ok(Json(lesson))
}
