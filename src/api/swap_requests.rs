use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{NewSwapRequest, SwapRequestDetail, SwapSession};
use crate::db::swap_requests::RequestDirection;
use crate::db::SwapRequestRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub direction: Option<RequestDirection>,
}

/// POST /api/swap-requests
///
/// With explicit skill ids they are verified for ownership and OFFER
/// type; with none, the pairing rule selects them.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewSwapRequest>,
) -> Result<Json<SwapRequestDetail>, AppError> {
    let request = SwapRequestRepository::create(
        &state.db,
        &user.id,
        &req.receiver_id,
        req.requester_skill_id.as_deref(),
        req.receiver_skill_id.as_deref(),
        req.message,
    )
    .await?;

    Ok(Json(request))
}

/// GET /api/swap-requests?direction=sent|received
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SwapRequestDetail>>, AppError> {
    let requests =
        SwapRequestRepository::list_for_user(&state.db, &user.id, query.direction).await?;
    Ok(Json(requests))
}

/// POST /api/swap-requests/:id/accept (receiver only)
pub async fn accept(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> Result<Json<SwapSession>, AppError> {
    let session = SwapRequestRepository::accept(&state.db, &request_id, &user.id).await?;
    Ok(Json(session))
}

/// POST /api/swap-requests/:id/reject (receiver only)
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> Result<Json<SwapRequestDetail>, AppError> {
    let request = SwapRequestRepository::reject(&state.db, &request_id, &user.id).await?;
    Ok(Json(request))
}
