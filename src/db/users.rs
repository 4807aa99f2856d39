use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{User, UserProfile};
use crate::error::AppError;

const PROFILE_COLUMNS: &str =
    "id, username, email, full_name, bio, profile_pic, rating, total_swaps, is_admin, created_at";

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_admin: bool,
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &Pool<Sqlite>, new: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (id, username, email, password_hash, password_salt, full_name, bio, profile_pic, is_admin, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.password_salt)
        .bind(&new.full_name)
        .bind(&new.bio)
        .bind(&new.profile_pic)
        .bind(new.is_admin)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Used by registration to reject duplicates in a single round trip.
    pub async fn exists_by_username_or_email(
        pool: &Pool<Sqlite>,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1")
                .bind(username)
                .bind(email)
                .fetch_optional(pool)
                .await?;

        Ok(found.is_some())
    }

    pub async fn profile(pool: &Pool<Sqlite>, id: &str) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Partial profile update; absent fields keep their stored value.
    pub async fn update_profile(
        pool: &Pool<Sqlite>,
        id: &str,
        full_name: Option<String>,
        bio: Option<String>,
    ) -> Result<UserProfile, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
UPDATE users
SET full_name = COALESCE(?, full_name), bio = COALESCE(?, bio)
WHERE id = ?
RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(full_name)
        .bind(bio)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(profile)
    }

    /// Replace the profile picture reference, returning the previous one so
    /// the caller can clean up the old file.
    pub async fn set_profile_pic(
        pool: &Pool<Sqlite>,
        id: &str,
        path: &str,
    ) -> Result<Option<String>, AppError> {
        let old: Option<Option<String>> =
            sqlx::query_scalar("SELECT profile_pic FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        let old = old.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        sqlx::query("UPDATE users SET profile_pic = ? WHERE id = ?")
            .bind(path)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(old)
    }
}
