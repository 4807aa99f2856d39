use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{DirectRating, NewReview, Review, ReviewDetail};
use crate::db::ReviewRepository;
use crate::error::AppError;

/// POST /api/reviews
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewReview>,
) -> Result<Json<ReviewDetail>, AppError> {
    let review = ReviewRepository::create(&state.db, &user.id, req).await?;
    Ok(Json(review))
}

/// POST /api/reviews/rate/:user_id - idempotent per (rater, ratee)
pub async fn rate_direct(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ratee_id): Path<String>,
    Json(req): Json<DirectRating>,
) -> Result<Json<Review>, AppError> {
    let review = ReviewRepository::rate_direct(&state.db, &user.id, &ratee_id, req).await?;
    Ok(Json(review))
}

/// GET /api/reviews/swap/:id (participants only)
pub async fn list_for_swap(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(swap_session_id): Path<String>,
) -> Result<Json<Vec<ReviewDetail>>, AppError> {
    let reviews = ReviewRepository::list_for_swap(&state.db, &user.id, &swap_session_id).await?;
    Ok(Json(reviews))
}

/// GET /api/reviews/user/:id
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ReviewDetail>>, AppError> {
    let reviews = ReviewRepository::list_for_user(&state.db, &user_id).await?;
    Ok(Json(reviews))
}
