pub mod admin;
pub mod auth;
pub mod learning_sessions;
pub mod matching;
pub mod messages;
pub mod middleware;
pub mod resources;
pub mod reviews;
pub mod skills;
pub mod state;
pub mod swap_requests;
pub mod swap_sessions;
pub mod upload;
pub mod users;

pub use middleware::{AuthUser, RateLimiter};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    // Admin routes sit behind both the auth middleware and the admin gate.
    let admin_routes = Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/swap-requests", get(admin::list_requests))
        .route("/api/admin/swap-sessions", get(admin::list_sessions))
        .route(
            "/api/admin/swap-sessions/:id/cancel",
            post(admin::cancel_session),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    let protected = Router::new()
        // Session/identity
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Profiles
        .route("/api/users/:id", get(users::get_user).put(users::update_user))
        .route("/api/upload/profile-pic", post(upload::profile_pic))
        // Skills
        .route("/api/skills", get(skills::list_all).post(skills::create))
        .route("/api/skills/user/:id", get(skills::list_for_user))
        .route(
            "/api/skills/:id",
            put(skills::update).delete(skills::delete),
        )
        // Matching
        .route("/api/matching/matches", get(matching::matches))
        .route("/api/matching/details/:id", get(matching::details))
        // Swap requests
        .route(
            "/api/swap-requests",
            get(swap_requests::list).post(swap_requests::create),
        )
        .route("/api/swap-requests/:id/accept", post(swap_requests::accept))
        .route("/api/swap-requests/:id/reject", post(swap_requests::reject))
        // Swap sessions
        .route("/api/swap-sessions", get(swap_sessions::list))
        .route("/api/swap-sessions/:id", get(swap_sessions::get))
        .route(
            "/api/swap-sessions/:id/complete",
            post(swap_sessions::complete),
        )
        // Learning sessions
        .route("/api/learning-sessions", post(learning_sessions::create))
        .route(
            "/api/learning-sessions/swap/:id",
            get(learning_sessions::list_for_swap),
        )
        .route("/api/learning-sessions/:id", put(learning_sessions::update))
        // Resources
        .route("/api/resources", post(resources::create))
        .route("/api/resources/swap/:id", get(resources::list_for_swap))
        .route("/api/resources/:id", delete(resources::delete))
        // Messages
        .route("/api/messages", post(messages::create))
        .route("/api/messages/swap/:id", get(messages::list_for_swap))
        // Reviews
        .route("/api/reviews", post(reviews::create))
        .route("/api/reviews/rate/:id", post(reviews::rate_direct))
        .route("/api/reviews/swap/:id", get(reviews::list_for_swap))
        .route("/api/reviews/user/:id", get(reviews::list_for_user))
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let max_body = state.config.max_upload_bytes + 1024 * 1024;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/api/health", get(health))
        // Open authentication endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        // Add rate limiting middleware
        .layer(axum_middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }))
        // Multipart uploads need more than the default body cap
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
