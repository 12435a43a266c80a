use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Image, UpdateImage};
use crate::routes::caller;
use crate::services::images::{self, StoredUpload, MAX_IMAGE_BYTES};
use crate::AppState;

const MAX_NAME_LEN: usize = 255;

// --- POST /me/images ---

pub async fn upload_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Image>>> {
    let profile = caller(&state, &user)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ImageUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let ext = images::extension_for(&content_type)?;

    let image_id = Uuid::now_v7();
    let name: String = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{image_id}.{ext}"))
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read file data: {e}")))?;

    if data.len() > MAX_IMAGE_BYTES {
        return Err(AppError::new(ErrorCode::PayloadTooLarge, "image exceeds 10 MiB"));
    }

    let key = images::object_key(profile.id, image_id, ext);
    let size = data.len() as i64;

    let url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::ImageUploadFailed, e.to_string()))?;

    let upload = StoredUpload { id: image_id, name, url, object_key: key.clone(), size };
    match images::record_upload(&state.store, &profile, upload, Utc::now()) {
        Ok(image) => Ok(Json(ApiResponse::ok(image))),
        Err(e) => {
            // The row never landed, so the object would be unreachable.
            if let Err(cleanup) = state.minio.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "failed to remove orphaned image");
            }
            Err(e)
        }
    }
}

// --- PATCH /me/images/:id ---

pub async fn update_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateImage>,
) -> AppResult<Json<ApiResponse<Image>>> {
    let profile = caller(&state, &user)?;
    let image = images::update_image(&state.store, &profile, id, changes, Utc::now())?;
    Ok(Json(ApiResponse::ok(image)))
}

// --- DELETE /me/images/:id ---

pub async fn delete_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let profile = caller(&state, &user)?;
    images::delete_image(&state.store, &profile, id, Utc::now())?;
    Ok(Json(ApiResponse::ok(())))
}
