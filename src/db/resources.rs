use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{NewResource, Resource, ResourceDetail, SwapStatus};
use crate::db::swap_sessions::SwapSessionRepository;
use crate::error::AppError;

const DETAIL_SELECT: &str = r#"
SELECT r.*, u.username AS uploaded_by_username, u.full_name AS uploaded_by_name
FROM resources r
JOIN users u ON r.uploaded_by = u.id
"#;

pub struct ResourceRepository;

impl ResourceRepository {
    /// Share a resource in an ACTIVE swap.
    pub async fn create(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        new: NewResource,
    ) -> Result<ResourceDetail, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let session =
            SwapSessionRepository::get_for_participant(pool, &new.swap_session_id, actor_id)
                .await?;
        if session.status != SwapStatus::Active {
            return Err(AppError::Conflict(
                "Swap session is not active".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
INSERT INTO resources (id, swap_session_id, uploaded_by, resource_type, title, content, file_path, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.swap_session_id)
        .bind(actor_id)
        .bind(new.resource_type)
        .bind(new.title.trim())
        .bind(&new.content)
        .bind(&new.file_path)
        .bind(created_at)
        .execute(pool)
        .await?;

        let resource = sqlx::query_as::<_, ResourceDetail>(&format!(
            "{DETAIL_SELECT} WHERE r.id = ?"
        ))
        .bind(&id)
        .fetch_one(pool)
        .await?;

        Ok(resource)
    }

    pub async fn list_for_swap(
        pool: &Pool<Sqlite>,
        actor_id: &str,
        swap_session_id: &str,
    ) -> Result<Vec<ResourceDetail>, AppError> {
        SwapSessionRepository::get_for_participant(pool, swap_session_id, actor_id).await?;
        Self::list_rows(pool, swap_session_id).await
    }

    pub(crate) async fn list_rows(
        pool: &Pool<Sqlite>,
        swap_session_id: &str,
    ) -> Result<Vec<ResourceDetail>, AppError> {
        let resources = sqlx::query_as::<_, ResourceDetail>(&format!(
            "{DETAIL_SELECT} WHERE r.swap_session_id = ? ORDER BY r.created_at DESC"
        ))
        .bind(swap_session_id)
        .fetch_all(pool)
        .await?;

        Ok(resources)
    }

    /// Deletable by the uploader or either participant, at any session
    /// status.
    pub async fn delete(pool: &Pool<Sqlite>, actor_id: &str, id: &str) -> Result<(), AppError> {
        let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

        if resource.uploaded_by != actor_id {
            let session = SwapSessionRepository::get_by_id(pool, &resource.swap_session_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Swap session not found".to_string()))?;
            if !session.is_participant(actor_id) {
                return Err(AppError::Forbidden(
                    "Not authorized to delete this resource".to_string(),
                ));
            }
        }

        sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ResourceType;
    use crate::db::swap_sessions::SwapSessionRepository;
    use crate::db::testing;

    fn resource_input(session_id: &str) -> NewResource {
        NewResource {
            swap_session_id: session_id.to_string(),
            resource_type: ResourceType::Link,
            title: "The Book".to_string(),
            content: Some("https://doc.rust-lang.org/book/".to_string()),
            file_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_gated_on_active_parent() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let resource = ResourceRepository::create(&pool, &alice.id, resource_input(&session.id))
            .await
            .unwrap();
        assert_eq!(resource.uploaded_by, alice.id);

        SwapSessionRepository::complete(&pool, &session.id, &bob.id)
            .await
            .unwrap();

        let err = ResourceRepository::create(&pool, &alice.id, resource_input(&session.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_other_participant_may_delete_after_completion() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;
        let mallory = testing::user(&pool, "mallory").await;
        let session = testing::active_swap(&pool, &alice, &bob).await;

        let resource = ResourceRepository::create(&pool, &alice.id, resource_input(&session.id))
            .await
            .unwrap();

        let err = ResourceRepository::delete(&pool, &mallory.id, &resource.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        SwapSessionRepository::complete(&pool, &session.id, &bob.id)
            .await
            .unwrap();

        // Bob did not upload it but participates in the swap.
        ResourceRepository::delete(&pool, &bob.id, &resource.id)
            .await
            .unwrap();
        let remaining = ResourceRepository::list_rows(&pool, &session.id).await.unwrap();
        assert!(remaining.is_empty());
    }
}
