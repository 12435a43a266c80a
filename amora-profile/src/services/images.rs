//! Image metadata. Bytes live in the object store; only the URL and the
//! visibility flags are kept here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Image, NewImage, Profile, UpdateImage};
use crate::repository::ImageRepository;
use crate::services::profile_service::ensure_active;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> AppResult<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(AppError::new(
            ErrorCode::ImageUploadFailed,
            "unsupported image format, accepted: jpeg, png, webp",
        )),
    }
}

pub fn object_key(profile_id: Uuid, image_id: Uuid, ext: &str) -> String {
    format!("profiles/{profile_id}/{image_id}.{ext}")
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub object_key: String,
    pub size: i64,
}

/// Records an uploaded object. A profile's first visible image becomes primary.
pub fn record_upload<S>(store: &S, owner: &Profile, upload: StoredUpload, now: DateTime<Utc>) -> AppResult<Image>
where
    S: ImageRepository + ?Sized,
{
    ensure_active(owner)?;
    let is_primary = store.public_images(owner.id)?.is_empty();

    let image = store.insert_image(NewImage {
        id: upload.id,
        profile_id: owner.id,
        name: upload.name,
        url: upload.url,
        object_key: upload.object_key,
        size: upload.size,
        is_primary,
        is_private: false,
        created_at: now,
        updated_at: now,
    })?;

    tracing::info!(profile_id = %owner.id, image_id = %image.id, size = image.size, "image uploaded");
    Ok(image)
}

/// Another profile's image and a deleted one look the same to the caller.
fn owned<S>(store: &S, owner: &Profile, id: Uuid) -> AppResult<Image>
where
    S: ImageRepository + ?Sized,
{
    store
        .find_image(id)?
        .filter(|img| img.profile_id == owner.id && !img.is_deleted)
        .ok_or_else(|| AppError::new(ErrorCode::ImageNotFound, "image not found"))
}

pub fn update_image<S>(
    store: &S,
    owner: &Profile,
    id: Uuid,
    changes: UpdateImage,
    now: DateTime<Utc>,
) -> AppResult<Image>
where
    S: ImageRepository + ?Sized,
{
    ensure_active(owner)?;
    owned(store, owner, id)?;
    store.update_image(id, &changes, now)
}

pub fn delete_image<S>(store: &S, owner: &Profile, id: Uuid, now: DateTime<Utc>) -> AppResult<()>
where
    S: ImageRepository + ?Sized,
{
    ensure_active(owner)?;
    owned(store, owner, id)?;
    let promoted = store.soft_delete_image(id, now)?;
    tracing::info!(
        profile_id = %owner.id,
        image_id = %id,
        promoted_id = ?promoted.as_ref().map(|i| i.id),
        "image deleted"
    );
    Ok(())
}
