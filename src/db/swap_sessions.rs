use std::collections::HashSet;

use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::db::learning_sessions::LearningSessionRepository;
use crate::db::messages::MessageRepository;
use crate::db::models::{
    LearningSessionDetail, Message, ResourceDetail, SwapSession, SwapSessionDetail, SwapStatus,
};
use crate::db::resources::ResourceRepository;
use crate::error::AppError;

const DETAIL_SELECT: &str = r#"
SELECT ss.id, ss.swap_request_id, ss.user1_id, ss.user2_id, ss.user1_skill_id, ss.user2_skill_id,
       ss.status, ss.started_at, ss.completed_at,
       u1.username AS user1_username, u1.full_name AS user1_name,
       u2.username AS user2_username, u2.full_name AS user2_name,
       s1.skill_name AS user1_skill_name,
       s2.skill_name AS user2_skill_name
FROM swap_sessions ss
JOIN users u1 ON ss.user1_id = u1.id
JOIN users u2 ON ss.user2_id = u2.id
JOIN skills s1 ON ss.user1_skill_id = s1.id
JOIN skills s2 ON ss.user2_skill_id = s2.id
"#;

/// A swap session with all of its child entities, as shown on the active
/// swap page.
#[derive(Debug, Serialize)]
pub struct SwapSessionWithChildren {
    pub swap_session: SwapSessionDetail,
    pub learning_sessions: Vec<LearningSessionDetail>,
    pub resources: Vec<ResourceDetail>,
    pub messages: Vec<Message>,
}

pub struct SwapSessionRepository;

impl SwapSessionRepository {
    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: &str,
    ) -> Result<Option<SwapSession>, AppError> {
        let session = sqlx::query_as::<_, SwapSession>("SELECT * FROM swap_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(session)
    }

    /// Fetch a session and fail unless `actor_id` participates in it.
    pub(crate) async fn get_for_participant(
        pool: &Pool<Sqlite>,
        id: &str,
        actor_id: &str,
    ) -> Result<SwapSession, AppError> {
        let session = Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap session not found".to_string()))?;
        if !session.is_participant(actor_id) {
            return Err(AppError::Forbidden(
                "Not authorized to access this swap session".to_string(),
            ));
        }
        Ok(session)
    }

    /// All sessions the user participates in, deduplicated by unordered
    /// participant pair: a pair of users has one meaningfully current swap,
    /// so only the most recently started row per pair is surfaced.
    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<SwapSessionDetail>, AppError> {
        let rows = sqlx::query_as::<_, SwapSessionDetail>(&format!(
            "{DETAIL_SELECT} WHERE ss.user1_id = ? OR ss.user2_id = ? ORDER BY ss.started_at DESC"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
        let mut deduped = Vec::new();
        for row in rows {
            let pair = if row.user1_id <= row.user2_id {
                (row.user1_id.clone(), row.user2_id.clone())
            } else {
                (row.user2_id.clone(), row.user1_id.clone())
            };
            if seen_pairs.insert(pair) {
                deduped.push(row);
            }
        }

        Ok(deduped)
    }

    /// Session with all children; participant-only.
    pub async fn get_detail(
        pool: &Pool<Sqlite>,
        id: &str,
        actor_id: &str,
    ) -> Result<SwapSessionWithChildren, AppError> {
        Self::get_for_participant(pool, id, actor_id).await?;

        let swap_session = sqlx::query_as::<_, SwapSessionDetail>(&format!(
            "{DETAIL_SELECT} WHERE ss.id = ?"
        ))
        .bind(id)
        .fetch_one(pool)
        .await?;

        let learning_sessions = LearningSessionRepository::list_rows(pool, id).await?;
        let resources = ResourceRepository::list_rows(pool, id).await?;
        let messages = MessageRepository::list_rows(pool, id).await?;

        Ok(SwapSessionWithChildren {
            swap_session,
            learning_sessions,
            resources,
            messages,
        })
    }

    /// ACTIVE -> COMPLETED by either participant. Sets completed_at and
    /// increments both participants' total_swaps in the same transaction.
    pub async fn complete(
        pool: &Pool<Sqlite>,
        id: &str,
        actor_id: &str,
    ) -> Result<SwapSession, AppError> {
        let session = Self::get_for_participant(pool, id, actor_id).await?;
        if session.status != SwapStatus::Active {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE swap_sessions SET status = 'COMPLETED', completed_at = ? WHERE id = ? AND status = 'ACTIVE'",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }

        sqlx::query("UPDATE users SET total_swaps = total_swaps + 1 WHERE id IN (?, ?)")
            .bind(&session.user1_id)
            .bind(&session.user2_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch swap session".to_string()))
    }

    /// Admin override: ACTIVE -> CANCELLED regardless of participant
    /// consent. Deliberately skips the completion side effects.
    pub async fn admin_cancel(pool: &Pool<Sqlite>, id: &str) -> Result<SwapSession, AppError> {
        let session = Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap session not found".to_string()))?;
        if session.status != SwapStatus::Active {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }

        let updated = sqlx::query(
            "UPDATE swap_sessions SET status = 'CANCELLED' WHERE id = ? AND status = 'ACTIVE'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch swap session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::db::users::UserRepository;

    #[tokio::test]
    async fn test_complete_increments_swap_counts_once() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let completed = SwapSessionRepository::complete(&pool, &session.id, &alice.id)
            .await
            .unwrap();
        assert_eq!(completed.status, SwapStatus::Completed);
        assert!(completed.completed_at.is_some());

        let alice_after = UserRepository::get_by_id(&pool, &alice.id).await.unwrap().unwrap();
        let bob_after = UserRepository::get_by_id(&pool, &bob.id).await.unwrap().unwrap();
        assert_eq!(alice_after.total_swaps, 1);
        assert_eq!(bob_after.total_swaps, 1);

        // Completing again conflicts and must not double-count.
        let err = SwapSessionRepository::complete(&pool, &session.id, &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let alice_after = UserRepository::get_by_id(&pool, &alice.id).await.unwrap().unwrap();
        assert_eq!(alice_after.total_swaps, 1);
    }

    #[tokio::test]
    async fn test_only_participants_complete() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let mallory = testing::user(&pool, "mallory").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let err = SwapSessionRepository::complete(&pool, &session.id, &mallory.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_deduplicates_by_participant_pair() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let carol = testing::user(&pool, "carol").await;

        let first = testing::completed_swap(&pool, &alice, &bob).await;
        let second = testing::active_swap(&pool, &bob, &alice).await;
        testing::active_swap(&pool, &alice, &carol).await;

        // Make the second alice-bob session strictly later.
        sqlx::query("UPDATE swap_sessions SET started_at = started_at + 100 WHERE id = ?")
            .bind(&second.id)
            .execute(&pool)
            .await
            .unwrap();

        let sessions = SwapSessionRepository::list_for_user(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 2);
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&second.id.as_str()));
        assert!(!ids.contains(&first.id.as_str()));
    }

    #[tokio::test]
    async fn test_admin_cancel_skips_side_effects() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let cancelled = SwapSessionRepository::admin_cancel(&pool, &session.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);

        let alice_after = UserRepository::get_by_id(&pool, &alice.id).await.unwrap().unwrap();
        assert_eq!(alice_after.total_swaps, 0);

        let err = SwapSessionRepository::admin_cancel(&pool, &session.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
