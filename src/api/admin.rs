use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::state::AppState;
use crate::db::admin::{AdminStats, AdminUserRow};
use crate::db::models::{SwapRequestDetail, SwapSession, SwapSessionDetail};
use crate::db::{AdminRepository, SwapSessionRepository};
use crate::error::AppError;

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    let stats = AdminRepository::stats(&state.db).await?;
    Ok(Json(stats))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserRow>>, AppError> {
    let users = AdminRepository::list_users(&state.db).await?;
    Ok(Json(users))
}

/// GET /api/admin/swap-requests
pub async fn list_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<SwapRequestDetail>>, AppError> {
    let requests = AdminRepository::list_requests(&state.db).await?;
    Ok(Json(requests))
}

/// GET /api/admin/swap-sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SwapSessionDetail>>, AppError> {
    let sessions = AdminRepository::list_sessions(&state.db).await?;
    Ok(Json(sessions))
}

/// POST /api/admin/swap-sessions/:id/cancel - dispute override, bypasses
/// the participant rule and skips completion side effects
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SwapSession>, AppError> {
    let session = SwapSessionRepository::admin_cancel(&state.db, &session_id).await?;
    Ok(Json(session))
}
