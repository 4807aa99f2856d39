use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{SwapSession, SwapSessionDetail};
use crate::db::swap_sessions::SwapSessionWithChildren;
use crate::db::SwapSessionRepository;
use crate::error::AppError;

/// GET /api/swap-sessions - deduplicated by participant pair
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SwapSessionDetail>>, AppError> {
    let sessions = SwapSessionRepository::list_for_user(&state.db, &user.id).await?;
    Ok(Json(sessions))
}

/// GET /api/swap-sessions/:id - session with all children
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SwapSessionWithChildren>, AppError> {
    let detail = SwapSessionRepository::get_detail(&state.db, &session_id, &user.id).await?;
    Ok(Json(detail))
}

/// POST /api/swap-sessions/:id/complete (either participant)
pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SwapSession>, AppError> {
    let session = SwapSessionRepository::complete(&state.db, &session_id, &user.id).await?;
    Ok(Json(session))
}
