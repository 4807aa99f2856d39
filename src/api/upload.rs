use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::UserRepository;
use crate::error::AppError;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub profile_pic: String,
}

/// POST /api/upload/profile-pic (multipart, field `profile_pic`)
///
/// Enforces the 5MB ceiling and the image-type allowlist before anything
/// touches disk. The replaced file is removed best-effort afterwards.
pub async fn profile_pic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("profile_pic") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::Validation("Missing file name".to_string()))?
            .to_string();
        let extension = filename
            .rsplit('.')
            .next()
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(
                "Only image files (jpeg, jpg, png, gif, webp) are allowed".to_string(),
            ));
        }
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(AppError::Validation(
                    "Only image uploads are allowed".to_string(),
                ));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
        if data.len() > state.config.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds the {} byte limit",
                state.config.max_upload_bytes
            )));
        }

        upload = Some((extension, data.to_vec()));
        break;
    }

    let (extension, data) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    let dir = format!("{}/profile_pics", state.config.upload_dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create upload dir: {}", e)))?;

    let filename = format!("profile-{}-{}.{}", user.id, Uuid::new_v4(), extension);
    let disk_path = format!("{}/{}", dir, filename);
    tokio::fs::write(&disk_path, &data)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to store upload: {}", e)))?;

    let public_path = format!("/uploads/profile_pics/{}", filename);
    let old = match UserRepository::set_profile_pic(&state.db, &user.id, &public_path).await {
        Ok(old) => old,
        Err(e) => {
            // The record was not updated; don't leave the orphan file behind.
            if let Err(cleanup) = tokio::fs::remove_file(&disk_path).await {
                tracing::warn!("failed to remove orphaned upload {}: {}", disk_path, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(old) = old.filter(|old| old != &public_path) {
        if let Some(relative) = old.strip_prefix("/uploads/") {
            let old_disk = format!("{}/{}", state.config.upload_dir, relative);
            if let Err(e) = tokio::fs::remove_file(&old_disk).await {
                tracing::warn!("failed to remove old profile pic {}: {}", old_disk, e);
            }
        }
    }

    Ok(Json(UploadResponse {
        profile_pic: public_path,
    }))
}
