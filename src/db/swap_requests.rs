use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::matching::MatchingRepository;
use crate::db::models::{
    RequestStatus, SkillType, SwapRequest, SwapRequestDetail, SwapSession,
};
use crate::db::skills::SkillRepository;
use crate::db::users::UserRepository;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Sent,
    Received,
}

const DETAIL_SELECT: &str = r#"
SELECT sr.id, sr.requester_id, sr.receiver_id, sr.requester_skill_id, sr.receiver_skill_id,
       sr.status, sr.message, sr.created_at, sr.updated_at,
       u1.username AS requester_username, u1.full_name AS requester_name, u1.rating AS requester_rating,
       u2.username AS receiver_username, u2.full_name AS receiver_name, u2.rating AS receiver_rating,
       s1.skill_name AS requester_skill_name,
       s2.skill_name AS receiver_skill_name
FROM swap_requests sr
JOIN users u1 ON sr.requester_id = u1.id
JOIN users u2 ON sr.receiver_id = u2.id
JOIN skills s1 ON sr.requester_skill_id = s1.id
JOIN skills s2 ON sr.receiver_skill_id = s2.id
"#;

pub struct SwapRequestRepository;

impl SwapRequestRepository {
    /// Create a swap request. When skill ids are given they are verified
    /// against the authoritative skill rows (ownership and OFFER type);
    /// when both are absent the pairing rule picks them.
    pub async fn create(
        pool: &Pool<Sqlite>,
        requester_id: &str,
        receiver_id: &str,
        requester_skill_id: Option<&str>,
        receiver_skill_id: Option<&str>,
        message: Option<String>,
    ) -> Result<SwapRequestDetail, AppError> {
        if requester_id == receiver_id {
            return Err(AppError::Validation(
                "Cannot create swap request with yourself".to_string(),
            ));
        }

        if UserRepository::get_by_id(pool, receiver_id).await?.is_none() {
            return Err(AppError::NotFound("Receiver not found".to_string()));
        }

        let (requester_skill, receiver_skill, message) =
            match (requester_skill_id, receiver_skill_id) {
                (Some(mine), Some(theirs)) => {
                    let requester_skill =
                        Self::verify_offer(pool, mine, requester_id, "requester").await?;
                    let receiver_skill =
                        Self::verify_offer(pool, theirs, receiver_id, "receiver").await?;
                    (requester_skill, receiver_skill, message)
                }
                (None, None) => {
                    let pair = MatchingRepository::auto_pair(pool, requester_id, receiver_id)
                        .await?;
                    let message = message.or_else(|| {
                        Some(format!(
                            "Hi! I'd like to swap {} for {}.",
                            pair.requester_skill.skill_name, pair.receiver_skill.skill_name
                        ))
                    });
                    (pair.requester_skill, pair.receiver_skill, message)
                }
                _ => {
                    return Err(AppError::Validation(
                        "Provide both skill ids or neither".to_string(),
                    ))
                }
            };

        // At most one PENDING request per ordered (requester, receiver) pair.
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM swap_requests WHERE requester_id = ? AND receiver_id = ? AND status = 'PENDING'",
        )
        .bind(requester_id)
        .bind(receiver_id)
        .fetch_optional(pool)
        .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "A pending swap request already exists with this user".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
INSERT INTO swap_requests (id, requester_id, receiver_id, requester_skill_id, receiver_skill_id, status, message, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, 'PENDING', ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(requester_id)
        .bind(receiver_id)
        .bind(&requester_skill.id)
        .bind(&receiver_skill.id)
        .bind(&message)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get_detail(pool, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created swap request".to_string()))
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: &str,
    ) -> Result<Option<SwapRequest>, AppError> {
        let request = sqlx::query_as::<_, SwapRequest>("SELECT * FROM swap_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(request)
    }

    pub async fn get_detail(
        pool: &Pool<Sqlite>,
        id: &str,
    ) -> Result<Option<SwapRequestDetail>, AppError> {
        let detail = sqlx::query_as::<_, SwapRequestDetail>(&format!(
            "{DETAIL_SELECT} WHERE sr.id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(detail)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        direction: Option<RequestDirection>,
    ) -> Result<Vec<SwapRequestDetail>, AppError> {
        let requests = match direction {
            Some(RequestDirection::Sent) => {
                sqlx::query_as::<_, SwapRequestDetail>(&format!(
                    "{DETAIL_SELECT} WHERE sr.requester_id = ? ORDER BY sr.created_at DESC"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
            Some(RequestDirection::Received) => {
                sqlx::query_as::<_, SwapRequestDetail>(&format!(
                    "{DETAIL_SELECT} WHERE sr.receiver_id = ? ORDER BY sr.created_at DESC"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SwapRequestDetail>(&format!(
                    "{DETAIL_SELECT} WHERE sr.requester_id = ? OR sr.receiver_id = ? ORDER BY sr.created_at DESC"
                ))
                .bind(user_id)
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(requests)
    }

    /// PENDING -> ACCEPTED, creating the swap session in the same
    /// transaction. The guarded UPDATE loses any race to a concurrent
    /// accept; UNIQUE(swap_request_id) backstops session creation.
    pub async fn accept(
        pool: &Pool<Sqlite>,
        request_id: &str,
        actor_id: &str,
    ) -> Result<SwapSession, AppError> {
        let request = Self::get_by_id(pool, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        if request.receiver_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the receiver can accept this request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict(
                "Swap request is not pending".to_string(),
            ));
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE swap_requests SET status = 'ACCEPTED', updated_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Swap request is not pending".to_string(),
            ));
        }

        let session_id = Uuid::new_v4().to_string();
        let session = sqlx::query_as::<_, SwapSession>(
            r#"
INSERT INTO swap_sessions (id, swap_request_id, user1_id, user2_id, user1_skill_id, user2_skill_id, status, started_at)
VALUES (?, ?, ?, ?, ?, ?, 'ACTIVE', ?)
RETURNING *
            "#,
        )
        .bind(&session_id)
        .bind(request_id)
        .bind(&request.requester_id)
        .bind(&request.receiver_id)
        .bind(&request.requester_skill_id)
        .bind(&request.receiver_skill_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// PENDING -> REJECTED. No session is created and the request is
    /// terminal afterwards.
    pub async fn reject(
        pool: &Pool<Sqlite>,
        request_id: &str,
        actor_id: &str,
    ) -> Result<SwapRequestDetail, AppError> {
        let request = Self::get_by_id(pool, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        if request.receiver_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the receiver can reject this request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict(
                "Swap request is not pending".to_string(),
            ));
        }

        let now = chrono::Utc::now().timestamp();
        let updated = sqlx::query(
            "UPDATE swap_requests SET status = 'REJECTED', updated_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(now)
        .bind(request_id)
        .execute(pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Swap request is not pending".to_string(),
            ));
        }

        Self::get_detail(pool, request_id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch swap request".to_string()))
    }

    async fn verify_offer(
        pool: &Pool<Sqlite>,
        skill_id: &str,
        owner_id: &str,
        side: &str,
    ) -> Result<crate::db::models::Skill, AppError> {
        let skill = SkillRepository::get_by_id(pool, skill_id).await?;
        match skill {
            Some(s) if s.user_id == owner_id && s.skill_type == SkillType::Offer => Ok(s),
            _ => Err(AppError::Validation(format!("Invalid {} skill", side))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SwapStatus;
    use crate::db::testing;

    #[tokio::test]
    async fn test_create_validations() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        let alice_offer = testing::skill(&pool, &alice, "Rust", SkillType::Offer).await;
        let bob_offer = testing::skill(&pool, &bob, "Go", SkillType::Offer).await;
        let bob_want = testing::skill(&pool, &bob, "Rust", SkillType::Want).await;

        // Self-request.
        let err = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &alice.id,
            Some(&alice_offer.id),
            Some(&alice_offer.id),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Receiver skill must be an OFFER of the receiver.
        let err = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_want.id),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Requester skill must belong to the requester.
        let err = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&bob_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            Some("let's trade".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.requester_skill_name, "Rust");

        // Second PENDING request to the same receiver conflicts.
        let err = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_accept_creates_exactly_one_session() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        let alice_offer = testing::skill(&pool, &alice, "Rust", SkillType::Offer).await;
        let bob_offer = testing::skill(&pool, &bob, "Go", SkillType::Offer).await;

        let request = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap();

        // Only the receiver may accept.
        let err = SwapRequestRepository::accept(&pool, &request.id, &alice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let session = SwapRequestRepository::accept(&pool, &request.id, &bob.id)
            .await
            .unwrap();
        assert_eq!(session.status, SwapStatus::Active);
        assert_eq!(session.user1_id, alice.id);
        assert_eq!(session.user2_id, bob.id);
        assert_eq!(session.user1_skill_id, alice_offer.id);
        assert_eq!(session.user2_skill_id, bob_offer.id);

        // A second accept fails and no second session appears.
        let err = SwapRequestRepository::accept(&pool, &request.id, &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM swap_sessions WHERE swap_request_id = ?")
                .bind(&request.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_reject_is_terminal_but_allows_new_request() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        let alice_offer = testing::skill(&pool, &alice, "Rust", SkillType::Offer).await;
        let bob_offer = testing::skill(&pool, &bob, "Go", SkillType::Offer).await;

        let request = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap();

        let rejected = SwapRequestRepository::reject(&pool, &request.id, &bob.id)
            .await
            .unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);

        // No session exists for the rejected request.
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM swap_sessions WHERE swap_request_id = ?")
                .bind(&request.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0);

        // The same request cannot be retried...
        let err = SwapRequestRepository::accept(&pool, &request.id, &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // ...but a fresh request may be opened.
        SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_auto_paired_request_gets_default_message() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        testing::skill(&pool, &alice, "JavaScript", SkillType::Want).await;
        testing::skill(&pool, &alice, "Design", SkillType::Offer).await;
        testing::skill(&pool, &bob, "JavaScript", SkillType::Offer).await;
        testing::skill(&pool, &bob, "Design", SkillType::Want).await;

        let request =
            SwapRequestRepository::create(&pool, &alice.id, &bob.id, None, None, None)
                .await
                .unwrap();
        assert_eq!(request.requester_skill_name, "Design");
        assert_eq!(request.receiver_skill_name, "JavaScript");
        assert_eq!(
            request.message.as_deref(),
            Some("Hi! I'd like to swap Design for JavaScript.")
        );
    }
}
