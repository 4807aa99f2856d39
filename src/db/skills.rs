use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{NewSkill, ProficiencyLevel, Skill, SkillWithOwner, UpdateSkill};
use crate::error::AppError;

pub struct SkillRepository;

impl SkillRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        new: NewSkill,
    ) -> Result<Skill, AppError> {
        if new.skill_name.trim().is_empty() {
            return Err(AppError::Validation("Skill name is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();
        let proficiency = new.proficiency_level.unwrap_or(ProficiencyLevel::Beginner);

        let skill = sqlx::query_as::<_, Skill>(
            r#"
INSERT INTO skills (id, user_id, skill_name, skill_type, description, proficiency_level, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(new.skill_name.trim())
        .bind(new.skill_type)
        .bind(&new.description)
        .bind(proficiency)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(skill)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Skill>, AppError> {
        let skill = sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(skill)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<Skill>, AppError> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE user_id = ? ORDER BY skill_type, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(skills)
    }

    pub async fn list_all(pool: &Pool<Sqlite>) -> Result<Vec<SkillWithOwner>, AppError> {
        let skills = sqlx::query_as::<_, SkillWithOwner>(
            r#"
SELECT s.*, u.username, u.full_name, u.rating
FROM skills s
JOIN users u ON s.user_id = u.id
ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(skills)
    }

    /// Owner-scoped update; absent fields keep their stored value.
    pub async fn update(
        pool: &Pool<Sqlite>,
        id: &str,
        owner_id: &str,
        update: UpdateSkill,
    ) -> Result<Skill, AppError> {
        Self::get_owned(pool, id, owner_id).await?;

        let skill = sqlx::query_as::<_, Skill>(
            r#"
UPDATE skills
SET skill_name = COALESCE(?, skill_name),
    skill_type = COALESCE(?, skill_type),
    description = COALESCE(?, description),
    proficiency_level = COALESCE(?, proficiency_level)
WHERE id = ? AND user_id = ?
RETURNING *
            "#,
        )
        .bind(update.skill_name)
        .bind(update.skill_type)
        .bind(update.description)
        .bind(update.proficiency_level)
        .bind(id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(skill)
    }

    pub async fn delete(pool: &Pool<Sqlite>, id: &str, owner_id: &str) -> Result<(), AppError> {
        Self::get_owned(pool, id, owner_id).await?;

        sqlx::query("DELETE FROM skills WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn get_owned(pool: &Pool<Sqlite>, id: &str, owner_id: &str) -> Result<Skill, AppError> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Skill not found or unauthorized".to_string()))
    }
}
