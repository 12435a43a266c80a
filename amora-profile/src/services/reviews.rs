use chrono::{DateTime, Utc};
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::pagination::{Page, PageRequest};

use crate::models::{NewReview, Profile, Review, UpdateReview};
use crate::repository::ReviewRepository;
use crate::services::profile_service::ensure_active;

pub const MAX_RATING: f32 = 5.0;

fn validate_rating(rating: f32) -> AppResult<()> {
    if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
        return Err(AppError::invalid_field(
            ErrorCode::ValidationError,
            "rating",
            format!("rating must be between 0 and {MAX_RATING}"),
        ));
    }
    Ok(())
}

/// Loads a review the caller is allowed to change.
fn authored<S>(store: &S, author: &Profile, id: Uuid) -> AppResult<Review>
where
    S: ReviewRepository + ?Sized,
{
    let review = store
        .find_review(id)?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound, "review not found"))?;

    if review.profile_id != author.id {
        return Err(AppError::forbidden("only the author can change a review"));
    }
    if review.has_deleted {
        return Err(AppError::new(ErrorCode::ReviewDeleted, "review has been deleted"));
    }
    Ok(review)
}

pub fn create_review<S>(store: &S, author: &Profile, message: String, rating: f32, now: DateTime<Utc>) -> AppResult<Review>
where
    S: ReviewRepository + ?Sized,
{
    ensure_active(author)?;
    validate_rating(rating)?;

    store.insert_review(NewReview {
        id: Uuid::now_v7(),
        profile_id: author.id,
        message,
        rating,
        created_at: now,
        updated_at: now,
    })
}

pub fn edit_review<S>(store: &S, author: &Profile, id: Uuid, changes: UpdateReview, now: DateTime<Utc>) -> AppResult<Review>
where
    S: ReviewRepository + ?Sized,
{
    authored(store, author, id)?;
    if let Some(rating) = changes.rating {
        validate_rating(rating)?;
    }
    store.update_review(id, &changes, now)
}

pub fn delete_review<S>(store: &S, author: &Profile, id: Uuid, now: DateTime<Utc>) -> AppResult<()>
where
    S: ReviewRepository + ?Sized,
{
    authored(store, author, id)?;
    store.soft_delete_review(id, now)
}

pub fn get_review<S>(store: &S, id: Uuid) -> AppResult<Review>
where
    S: ReviewRepository + ?Sized,
{
    store
        .find_review(id)?
        .filter(|r| !r.has_deleted)
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound, "review not found"))
}

pub fn list_reviews<S>(store: &S, page: PageRequest) -> AppResult<Page<Review>>
where
    S: ReviewRepository + ?Sized,
{
    let total = store.count_reviews()?;
    let items = store.list_reviews(page.offset() as i64, page.limit() as i64)?;
    Ok(Page::new(items, page, total as u64))
}
