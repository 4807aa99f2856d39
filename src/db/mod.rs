pub mod admin;
pub mod auth_sessions;
pub mod learning_sessions;
pub mod matching;
pub mod messages;
pub mod models;
pub mod resources;
pub mod reviews;
pub mod skills;
pub mod swap_requests;
pub mod swap_sessions;
pub mod users;

pub use admin::AdminRepository;
pub use auth_sessions::AuthSessionRepository;
pub use learning_sessions::LearningSessionRepository;
pub use matching::MatchingRepository;
pub use messages::MessageRepository;
pub use resources::ResourceRepository;
pub use reviews::ReviewRepository;
pub use skills::SkillRepository;
pub use swap_requests::SwapRequestRepository;
pub use swap_sessions::SwapSessionRepository;
pub use users::UserRepository;

/// Shared fixtures for the repository test suites. A single-connection
/// in-memory pool: every connection to `sqlite::memory:` is a distinct
/// database, so the pool must never open a second one.
#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    use super::models::{NewSkill, Skill, SkillType, SwapSession, User};
    use super::skills::SkillRepository;
    use super::swap_requests::SwapRequestRepository;
    use super::swap_sessions::SwapSessionRepository;
    use super::users::{NewUser, UserRepository};

    pub async fn pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    pub async fn user(pool: &Pool<Sqlite>, username: &str) -> User {
        UserRepository::create(
            pool,
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: vec![0u8; 32],
                password_salt: vec![0u8; 32],
                full_name: None,
                bio: None,
                profile_pic: None,
                is_admin: false,
            },
        )
        .await
        .expect("create user")
    }

    pub async fn skill(
        pool: &Pool<Sqlite>,
        owner: &User,
        name: &str,
        skill_type: SkillType,
    ) -> Skill {
        SkillRepository::create(
            pool,
            &owner.id,
            NewSkill {
                skill_name: name.to_string(),
                skill_type,
                description: None,
                proficiency_level: None,
            },
        )
        .await
        .expect("create skill")
    }

    /// Offer skills on both sides, a request from `a` to `b`, accepted by
    /// `b`: an ACTIVE swap session.
    pub async fn active_swap(pool: &Pool<Sqlite>, a: &User, b: &User) -> SwapSession {
        let a_offer = skill(pool, a, &format!("{}'s trade", a.username), SkillType::Offer).await;
        let b_offer = skill(pool, b, &format!("{}'s trade", b.username), SkillType::Offer).await;
        let request = SwapRequestRepository::create(
            pool,
            &a.id,
            &b.id,
            Some(&a_offer.id),
            Some(&b_offer.id),
            None,
        )
        .await
        .expect("create request");
        SwapRequestRepository::accept(pool, &request.id, &b.id)
            .await
            .expect("accept request")
    }

    pub async fn completed_swap(pool: &Pool<Sqlite>, a: &User, b: &User) -> SwapSession {
        let session = active_swap(pool, a, b).await;
        SwapSessionRepository::complete(pool, &session.id, &a.id)
            .await
            .expect("complete session")
    }
}
