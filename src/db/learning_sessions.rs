use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{
    LearningSession, LearningSessionDetail, NewLearningSession, SessionType, SwapStatus,
    UpdateLearningSession,
};
use crate::db::swap_sessions::SwapSessionRepository;
use crate::error::AppError;

const DETAIL_SELECT: &str = r#"
SELECT ls.*,
       t.username AS teacher_username, t.full_name AS teacher_name,
       st.username AS student_username, st.full_name AS student_name
FROM learning_sessions ls
JOIN users t ON ls.teacher_id = t.id
JOIN users st ON ls.student_id = st.id
"#;

pub struct LearningSessionRepository;

impl LearningSessionRepository {
    /// Schedule a lesson inside an ACTIVE swap. Teacher and student are
    /// checked against the authoritative session row, never trusted from
    /// the caller.
    pub async fn create(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        new: NewLearningSession,
    ) -> Result<LearningSession, AppError> {
        if new.topic.trim().is_empty() {
            return Err(AppError::Validation("Topic is required".to_string()));
        }
        match new.session_type {
            SessionType::Online if new.meeting_link.as_deref().unwrap_or("").is_empty() => {
                return Err(AppError::Validation(
                    "Meeting link is required for online sessions".to_string(),
                ));
            }
            SessionType::Offline if new.place.as_deref().unwrap_or("").is_empty() => {
                return Err(AppError::Validation(
                    "Meeting place is required for offline sessions".to_string(),
                ));
            }
            _ => {}
        }

        let session =
            SwapSessionRepository::get_for_participant(pool, &new.swap_session_id, actor_id)
                .await?;
        if session.status != SwapStatus::Active {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }
        if !session.is_participant(&new.teacher_id) || !session.is_participant(&new.student_id) {
            return Err(AppError::Validation(
                "Teacher and student must be part of the swap session".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let lesson = sqlx::query_as::<_, LearningSession>(
            r#"
INSERT INTO learning_sessions (id, swap_session_id, teacher_id, student_id, topic, session_type,
                               scheduled_date, duration_hours, status, notes, meeting_link, place, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'SCHEDULED', ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new.swap_session_id)
        .bind(&new.teacher_id)
        .bind(&new.student_id)
        .bind(new.topic.trim())
        .bind(new.session_type)
        .bind(new.scheduled_date)
        .bind(new.duration_hours.unwrap_or(1.0))
        .bind(&new.notes)
        .bind(&new.meeting_link)
        .bind(&new.place)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(lesson)
    }

    /// Update status and/or notes. Gated on parent-session participation
    /// but not on parent status: lessons stay editable after completion.
    pub async fn update(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        id: &str,
        update: UpdateLearningSession,
    ) -> Result<LearningSession, AppError> {
        if update.status.is_none() && update.notes.is_none() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let lesson = sqlx::query_as::<_, LearningSession>(
            "SELECT * FROM learning_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        SwapSessionRepository::get_for_participant(pool, &lesson.swap_session_id, actor_id)
            .await?;

        let updated = sqlx::query_as::<_, LearningSession>(
            r#"
UPDATE learning_sessions
SET status = COALESCE(?, status), notes = COALESCE(?, notes)
WHERE id = ?
RETURNING *
            "#,
        )
        .bind(update.status)
        .bind(update.notes)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(updated)
    }

    pub async fn list_for_swap(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        swap_session_id: &str,
    ) -> Result<Vec<LearningSessionDetail>, AppError> {
        SwapSessionRepository::get_for_participant(pool, swap_session_id, actor_id).await?;
        Self::list_rows(pool, swap_session_id).await
    }

    pub(crate) async fn list_rows(
        pool: &Pool<Sqlite>,
        swap_session_id: &str,
    ) -> Result<Vec<LearningSessionDetail>, AppError> {
        let lessons = sqlx::query_as::<_, LearningSessionDetail>(&format!(
            "{DETAIL_SELECT} WHERE ls.swap_session_id = ? ORDER BY ls.scheduled_date ASC"
        ))
        .bind(swap_session_id)
        .fetch_all(pool)
        .await?;

        Ok(lessons)
    }
}
