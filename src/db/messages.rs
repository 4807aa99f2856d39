use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{Message, NewMessage, SwapStatus};
use crate::db::swap_sessions::SwapSessionRepository;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    /// Chat stays open after completion: messages are accepted while the
    /// parent swap is ACTIVE or COMPLETED, never after cancellation.
    pub async fn create(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        new: NewMessage,
    ) -> Result<Message, AppError> {
        if new.message_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Message text is required".to_string(),
            ));
        }

        let session =
            SwapSessionRepository::get_for_participant(pool, &new.swap_session_id, actor_id)
                .await?;
        if session.status != SwapStatus::Active && session.status != SwapStatus::Completed {
            return Err(AppError::Conflict(
                "Can only send messages in active or completed swap sessions".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
INSERT INTO messages (id, swap_session_id, sender_id, message_text, created_at)
VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.swap_session_id)
        .bind(actor_id)
        .bind(new.message_text.trim())
        .bind(created_at)
        .execute(pool)
        .await?;

        // Fetch with username joined
        let message = Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created message".to_string()))?;

        Ok(message)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
SELECT m.id, m.swap_session_id, m.sender_id, u.username AS sender_username, m.message_text, m.created_at
FROM messages m
JOIN users u ON m.sender_id = u.id
WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    pub async fn list_for_swap(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        swap_session_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        SwapSessionRepository::get_for_participant(pool, swap_session_id, actor_id).await?;
        Self::list_rows(pool, swap_session_id).await
    }

    pub(crate) async fn list_rows(
        pool: &Pool<Sqlite>,
        swap_session_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
SELECT m.id, m.swap_session_id, m.sender_id, u.username AS sender_username, m.message_text, m.created_at
FROM messages m
JOIN users u ON m.sender_id = u.id
WHERE m.swap_session_id = ?
ORDER BY m.created_at ASC
            "#,
        )
        .bind(swap_session_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}
