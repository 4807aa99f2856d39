use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::auth::{hash_new_password, verify_password};
use crate::db::models::UserProfile;
use crate::db::users::NewUser;
use crate::db::{AuthSessionRepository, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserProfile,
}

/// Validate and sanitize username
fn validate_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(AppError::Validation(
            "Username must be 3-32 characters".to_string(),
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Username must be alphanumeric, underscore, or hyphen".to_string(),
        ));
    }

    // Convert to lowercase for consistency
    Ok(trimmed.to_lowercase())
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();
    if trimmed.len() < 3 || !trimmed.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = validate_username(&req.username)?;
    let email = validate_email(&req.email)?;

    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if UserRepository::exists_by_username_or_email(&state.db, &username, &email).await? {
        return Err(AppError::Conflict(
            "User already exists with this email or username".to_string(),
        ));
    }

    let (password_hash, password_salt) = hash_new_password(&req.password)?;

    let user = UserRepository::create(
        &state.db,
        NewUser {
            username,
            email,
            password_hash,
            password_salt,
            full_name: req.full_name,
            bio: req.bio,
            profile_pic: req.profile_pic,
            is_admin: req.is_admin,
        },
    )
    .await?;

    // Registration doubles as the first login.
    let session =
        AuthSessionRepository::create(&state.db, &user.id, state.config.session_expiry_hours)
            .await?;
    let profile = UserRepository::profile(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to fetch created user".to_string()))?;

    Ok(Json(AuthResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: profile,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = validate_email(&req.email)?;

    let user = UserRepository::get_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

    let valid = verify_password(&req.password, &user.password_hash, &user.password_salt)?;
    if !valid {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    let session =
        AuthSessionRepository::create(&state.db, &user.id, state.config.session_expiry_hours)
            .await?;
    let profile = UserRepository::profile(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::Internal("User vanished during login".to_string()))?;

    Ok(Json(AuthResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: profile,
    }))
}

/// POST /api/auth/logout (requires auth)
pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid Authorization format".to_string()))?;

    AuthSessionRepository::delete(&state.db, token).await?;

    Ok(Json(serde_json::json!({"success": true})))
}

/// GET /api/auth/me (requires auth)
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserRepository::profile(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}
