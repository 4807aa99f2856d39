use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{DirectRating, NewReview, Review, ReviewDetail, SwapSession, SwapStatus};
use crate::db::swap_sessions::SwapSessionRepository;
use crate::error::AppError;

const DETAIL_SELECT: &str = r#"
SELECT r.*,
       rev.username AS reviewer_username, rev.full_name AS reviewer_name,
       ree.username AS reviewee_username, ree.full_name AS reviewee_name
FROM reviews r
JOIN users rev ON r.reviewer_id = rev.id
JOIN users ree ON r.reviewee_id = ree.id
"#;

pub struct ReviewRepository;

impl ReviewRepository {
    /// Review the other participant of a COMPLETED swap. One review per
    /// (session, reviewer, reviewee); duplicates through this path are
    /// rejected rather than overwritten.
    pub async fn create(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        new: NewReview,
    ) -> Result<ReviewDetail, AppError> {
        validate_rating(new.rating)?;

        let session =
            SwapSessionRepository::get_for_participant(pool, &new.swap_session_id, actor_id)
                .await?;
        if session.status != SwapStatus::Completed {
            return Err(AppError::Conflict(
                "Can only review completed swap sessions".to_string(),
            ));
        }
        if new.reviewee_id == actor_id {
            return Err(AppError::Validation("Cannot review yourself".to_string()));
        }
        if session.other_participant(actor_id) != Some(new.reviewee_id.as_str()) {
            return Err(AppError::Validation(
                "Reviewee must be the other user in the swap".to_string(),
            ));
        }

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM reviews WHERE swap_session_id = ? AND reviewer_id = ? AND reviewee_id = ?",
        )
        .bind(&new.swap_session_id)
        .bind(actor_id)
        .bind(&new.reviewee_id)
        .fetch_optional(pool)
        .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "You have already reviewed this user for this swap".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
INSERT INTO reviews (id, swap_session_id, reviewer_id, reviewee_id, rating, comment, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.swap_session_id)
        .bind(actor_id)
        .bind(&new.reviewee_id)
        .bind(new.rating)
        .bind(&new.comment)
        .bind(created_at)
        .execute(pool)
        .await?;

        Self::recompute_or_warn(pool, &new.reviewee_id).await;

        let detail = sqlx::query_as::<_, ReviewDetail>(&format!("{DETAIL_SELECT} WHERE r.id = ?"))
            .bind(&id)
            .fetch_one(pool)
            .await?;

        Ok(detail)
    }

    /// Direct rating of another user, anchored to any COMPLETED swap the
    /// pair shares. Idempotent per (rater, ratee): a repeat overwrites the
    /// existing review instead of erroring.
    pub async fn rate_direct(
        pool: &Pool<Sqlite>,
        rater_id: &str,
        ratee_id: &str,
        rating: DirectRating,
    ) -> Result<Review, AppError> {
        validate_rating(rating.rating)?;
        if rater_id == ratee_id {
            return Err(AppError::Validation("Cannot rate yourself".to_string()));
        }

        let session = sqlx::query_as::<_, SwapSession>(
            r#"
SELECT * FROM swap_sessions
WHERE status = 'COMPLETED'
  AND ((user1_id = ? AND user2_id = ?) OR (user1_id = ? AND user2_id = ?))
ORDER BY COALESCE(completed_at, started_at) DESC
LIMIT 1
            "#,
        )
        .bind(rater_id)
        .bind(ratee_id)
        .bind(ratee_id)
        .bind(rater_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::Validation(
                "You can only rate users you have completed swaps with".to_string(),
            )
        })?;

        let existing: Option<String> = sqlx::query_scalar(
            r#"
SELECT r.id FROM reviews r
JOIN swap_sessions ss ON ss.id = r.swap_session_id
WHERE r.reviewer_id = ? AND r.reviewee_id = ? AND ss.status = 'COMPLETED'
  AND ((ss.user1_id = ? AND ss.user2_id = ?) OR (ss.user1_id = ? AND ss.user2_id = ?))
LIMIT 1
            "#,
        )
        .bind(rater_id)
        .bind(ratee_id)
        .bind(rater_id)
        .bind(ratee_id)
        .bind(ratee_id)
        .bind(rater_id)
        .fetch_optional(pool)
        .await?;

        let now = chrono::Utc::now().timestamp();
        let review_id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE reviews SET rating = ?, comment = ?, created_at = ? WHERE id = ?",
                )
                .bind(rating.rating)
                .bind(&rating.comment)
                .bind(now)
                .bind(&id)
                .execute(pool)
                .await?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"
INSERT INTO reviews (id, swap_session_id, reviewer_id, reviewee_id, rating, comment, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&session.id)
                .bind(rater_id)
                .bind(ratee_id)
                .bind(rating.rating)
                .bind(&rating.comment)
                .bind(now)
                .execute(pool)
                .await?;
                id
            }
        };

        Self::recompute_or_warn(pool, ratee_id).await;

        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(&review_id)
            .fetch_one(pool)
            .await?;

        Ok(review)
    }

    pub async fn list_for_swap(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        swap_session_id: &str,
    ) -> Result<Vec<ReviewDetail>, AppError> {
        SwapSessionRepository::get_for_participant(pool, swap_session_id, actor_id).await?;

        let reviews = sqlx::query_as::<_, ReviewDetail>(&format!(
            "{DETAIL_SELECT} WHERE r.swap_session_id = ? ORDER BY r.created_at DESC"
        ))
        .bind(swap_session_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<ReviewDetail>, AppError> {
        let reviews = sqlx::query_as::<_, ReviewDetail>(&format!(
            "{DETAIL_SELECT} WHERE r.reviewee_id = ? ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    /// Write-through recompute of the mean rating, rounded to 2 decimals.
    /// With no reviews the stored rating is left untouched.
    pub async fn recompute_rating(pool: &Pool<Sqlite>, user_id: &str) -> Result<(), AppError> {
        let avg: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating) FROM reviews WHERE reviewee_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        if let Some(avg) = avg {
            let rounded = (avg * 100.0).round() / 100.0;
            sqlx::query("UPDATE users SET rating = ? WHERE id = ?")
                .bind(rounded)
                .bind(user_id)
                .execute(pool)
                .await?;
        }

        Ok(())
    }

    // The review row is already committed; a failed recompute must not
    // undo it, only leave a trace.
    async fn recompute_or_warn(pool: &Pool<Sqlite>, user_id: &str) {
        if let Err(e) = Self::recompute_rating(pool, user_id).await {
            tracing::warn!("rating recompute failed for user {}: {}", user_id, e);
        }
    }
}

fn validate_rating(rating: i64) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::db::users::UserRepository;

    fn review_input(session_id: &str, reviewee: &str, rating: i64) -> NewReview {
        NewReview {
            swap_session_id: session_id.to_string(),
            reviewee_id: reviewee.to_string(),
            rating,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_review_requires_completed_session() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let err =
            ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &bob.id, 5))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rating_recomputed_to_exact_mean() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let carol = testing::user(&pool, "carol").await;

        let first = testing::completed_swap(&pool, &alice, &bob).await;
        let second = testing::completed_swap(&pool, &carol, &bob).await;

        ReviewRepository::create(&pool, &alice.id, review_input(&first.id, &bob.id, 5))
            .await
            .unwrap();
        let bob_after = UserRepository::get_by_id(&pool, &bob.id).await.unwrap().unwrap();
        assert_eq!(bob_after.rating, 5.0);

        ReviewRepository::create(&pool, &carol.id, review_input(&second.id, &bob.id, 4))
            .await
            .unwrap();
        let bob_after = UserRepository::get_by_id(&pool, &bob.id).await.unwrap().unwrap();
        assert_eq!(bob_after.rating, 4.5);
    }

    #[tokio::test]
    async fn test_review_gating_rules() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let mallory = testing::user(&pool, "mallory").await;
        let session = testing::completed_swap(&pool, &alice, &bob).await;

        // Rating bounds.
        let err =
            ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &bob.id, 6))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Self-review.
        let err =
            ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &alice.id, 5))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Reviewee must be the counterpart.
        let err =
            ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &mallory.id, 5))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Non-participant reviewer.
        let err =
            ReviewRepository::create(&pool, &mallory.id, review_input(&session.id, &bob.id, 5))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Duplicate through the session-scoped path.
        ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &bob.id, 5))
            .await
            .unwrap();
        let err =
            ReviewRepository::create(&pool, &alice.id, review_input(&session.id, &bob.id, 4))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_direct_rate_is_idempotent_per_pair() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        testing::completed_swap(&pool, &alice, &bob).await;

        ReviewRepository::rate_direct(
            &pool,
            &alice.id,
            &bob.id,
            DirectRating {
                rating: 5,
                comment: Some("great teacher".to_string()),
            },
        )
        .await
        .unwrap();

        ReviewRepository::rate_direct(
            &pool,
            &alice.id,
            &bob.id,
            DirectRating {
                rating: 3,
                comment: None,
            },
        )
        .await
        .unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE reviewer_id = ? AND reviewee_id = ?",
        )
        .bind(&alice.id)
        .bind(&bob.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);

        let bob_after = UserRepository::get_by_id(&pool, &bob.id).await.unwrap().unwrap();
        assert_eq!(bob_after.rating, 3.0);
    }

    #[tokio::test]
    async fn test_direct_rate_requires_completed_swap() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        testing::active_swap(&pool, &alice, &bob).await;

        let err = ReviewRepository::rate_direct(
            &pool,
            &alice.id,
            &bob.id,
            DirectRating {
                rating: 4,
                comment: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_recompute_without_reviews_leaves_rating() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;

        sqlx::query("UPDATE users SET rating = 3.7 WHERE id = ?")
            .bind(&alice.id)
            .execute(&pool)
            .await
            .unwrap();

        ReviewRepository::recompute_rating(&pool, &alice.id)
            .await
            .unwrap();

        let alice_after = UserRepository::get_by_id(&pool, &alice.id).await.unwrap().unwrap();
        assert_eq!(alice_after.rating, 3.7);
    }
}
