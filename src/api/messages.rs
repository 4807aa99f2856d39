use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::models::{Message, NewMessage};
use crate::db::MessageRepository;
use crate::error::AppError;

/// POST /api/messages
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewMessage>,
) -> Result<Json<Message>, AppError> {
    let message = MessageRepository::create(&state.db, &user.id, req).await?;
    Ok(Json(message))
}

/// GET /api/messages/swap/:id
pub async fn list_for_swap(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(swap_session_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = MessageRepository::list_for_swap(&state.db, &user.id, &swap_session_id).await?;
    Ok(Json(messages))
}
