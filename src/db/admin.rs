use serde::Serialize;
use sqlx::{FromRow, Pool, Sqlite};

use crate::db::models::{SwapRequestDetail, SwapSessionDetail};
use crate::error::AppError;

/// Platform counters, computed on demand.
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_swaps: i64,
    pub active_swaps: i64,
    pub completed_swaps: i64,
    pub total_skills: i64,
}

#[derive(Debug, FromRow, Serialize)]
pub struct AdminUserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub rating: f64,
    pub total_swaps: i64,
    pub is_admin: bool,
    pub created_at: i64,
}

pub struct AdminRepository;

impl AdminRepository {
    pub async fn stats(pool: &Pool<Sqlite>) -> Result<AdminStats, AppError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        let total_swaps: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM swap_sessions")
            .fetch_one(pool)
            .await?;
        let active_swaps: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM swap_sessions WHERE status = 'ACTIVE'")
                .fetch_one(pool)
                .await?;
        let completed_swaps: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM swap_sessions WHERE status = 'COMPLETED'")
                .fetch_one(pool)
                .await?;
        let total_skills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills")
            .fetch_one(pool)
            .await?;

        Ok(AdminStats {
            total_users,
            total_swaps,
            active_swaps,
            completed_swaps,
            total_skills,
        })
    }

    pub async fn list_users(pool: &Pool<Sqlite>) -> Result<Vec<AdminUserRow>, AppError> {
        let users = sqlx::query_as::<_, AdminUserRow>(
            r#"
SELECT id, username, email, full_name, rating, total_swaps, is_admin, created_at
FROM users
ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn list_requests(pool: &Pool<Sqlite>) -> Result<Vec<SwapRequestDetail>, AppError> {
        let requests = sqlx::query_as::<_, SwapRequestDetail>(
            r#"
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
ORDER BY sr.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    pub async fn list_sessions(pool: &Pool<Sqlite>) -> Result<Vec<SwapSessionDetail>, AppError> {
        let sessions = sqlx::query_as::<_, SwapSessionDetail>(
            r#"
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
ORDER BY ss.started_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }
}
