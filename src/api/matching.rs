use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{MatchCandidate, MatchDetail};
use crate::db::MatchingRepository;
use crate::error::AppError;

/// GET /api/matching/matches
pub async fn matches(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MatchCandidate>>, AppError> {
    let matches = MatchingRepository::compute_matches(&state.db, &user.id).await?;
    Ok(Json(matches))
}

/// GET /api/matching/details/:other_id
pub async fn details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<String>,
) -> Result<Json<MatchDetail>, AppError> {
    let detail = MatchingRepository::match_detail(&state.db, &user.id, &other_id).await?;
    Ok(Json(detail))
}
