//! Storage seam for the profile service.
//!
//! Diesel is synchronous, so these traits are too. [`postgres::PgStore`]
//! is the production implementation; tests run the engine against an
//! in-memory one.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use amora_shared::errors::AppResult;

use crate::models::{
    Block, Complaint, FilterPreference, Image, Like, Navigator, NewComplaint, NewImage,
    NewProfile, NewReview, Profile, Review, UpdateImage, UpdateProfile, UpdateReview,
};
use crate::services::discovery::BirthdateWindow;
use crate::services::distance::{BoundingBox, Point};

pub mod postgres;

#[cfg(test)]
pub mod memory;

/// Saved discovery criteria as written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterValues {
    pub search_gender: String,
    pub looking_for: String,
    pub age_from: i32,
    pub age_to: i32,
    pub distance_km: i32,
    pub page: i32,
    pub size: i32,
}

/// Storage-side candidate predicate. Covers the hard exclusions, the
/// demographic filter and the bounding-box prefilter; the exact radius
/// check happens in process.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub viewer_id: Uuid,
    /// `None` matches every gender.
    pub gender: Option<String>,
    pub birthdays: BirthdateWindow,
    pub bbox: BoundingBox,
}

/// A candidate profile together with its navigator position.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub profile_id: Uuid,
    pub last_online: DateTime<Utc>,
    pub is_show_distance: bool,
    pub location: Point,
}

#[derive(Debug, Clone)]
pub struct ComplaintRecord {
    pub complaint: Complaint,
    pub complaints_this_month: i64,
    /// True only when this complaint flipped the accused's flag.
    pub accused_suspended: bool,
}

pub trait ProfileRepository: Send + Sync {
    /// Inserts the profile, its filter and (optionally) its navigator atomically.
    fn create_profile(
        &self,
        profile: NewProfile,
        filter: &FilterValues,
        location: Option<Point>,
    ) -> AppResult<Profile>;

    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;

    fn find_profile_by_credential(&self, credential_id: Uuid) -> AppResult<Option<Profile>>;

    fn find_profile_by_telegram(&self, telegram_id: i64) -> AppResult<Option<Profile>>;

    fn update_profile(&self, id: Uuid, changes: &UpdateProfile, now: DateTime<Utc>) -> AppResult<Profile>;

    fn touch_last_online(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Sets the global `is_blocked` flag. Never cleared by this service.
    fn set_profile_blocked(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Soft delete: flags the profile, blanks personal fields, deletes its
    /// images and zeroes its navigator and filter in one transaction.
    fn soft_delete_profile(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    fn ping(&self) -> AppResult<()>;
}

pub trait LocationRepository: Send + Sync {
    fn find_navigator(&self, profile_id: Uuid) -> AppResult<Option<Navigator>>;

    fn upsert_navigator(&self, profile_id: Uuid, point: Point, now: DateTime<Utc>) -> AppResult<Navigator>;

    fn find_filter(&self, profile_id: Uuid) -> AppResult<Option<FilterPreference>>;

    fn upsert_filter(&self, profile_id: Uuid, values: &FilterValues, now: DateTime<Utc>) -> AppResult<FilterPreference>;

    fn candidates(&self, query: &CandidateQuery) -> AppResult<Vec<CandidateRow>>;
}

pub trait TrustRepository: Send + Sync {
    fn find_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<Option<Like>>;

    fn find_like_by_id(&self, id: Uuid) -> AppResult<Option<Like>>;

    /// Creates the edge for the ordered pair or flips the existing one.
    fn upsert_like(&self, liker_id: Uuid, liked_id: Uuid, is_liked: bool, now: DateTime<Utc>) -> AppResult<Like>;

    fn find_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<Option<Block>>;

    /// Writes `a -> b` and `b -> a` in one transaction.
    fn block_mutual(&self, a: Uuid, b: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Stores the complaint, blocks the accused for the complainant, and
    /// sets the accused's global flag once complaints since `month_start`
    /// exceed `limit`. All of it commits in one transaction.
    fn record_complaint(
        &self,
        complaint: NewComplaint,
        month_start: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<ComplaintRecord>;
}

pub trait ImageRepository: Send + Sync {
    fn insert_image(&self, image: NewImage) -> AppResult<Image>;

    fn find_image(&self, id: Uuid) -> AppResult<Option<Image>>;

    /// Applies the changes; marking an image primary clears the flag on the
    /// owner's other images.
    fn update_image(&self, id: Uuid, changes: &UpdateImage, now: DateTime<Utc>) -> AppResult<Image>;

    /// Deletes the image. When it was primary, the owner's oldest public
    /// image takes over in the same transaction and is returned.
    fn soft_delete_image(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Image>>;

    /// Public images in insertion order.
    fn public_images(&self, profile_id: Uuid) -> AppResult<Vec<Image>>;

    /// First public image per profile.
    fn first_public_images(&self, profile_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Image>>;
}

pub trait ReviewRepository: Send + Sync {
    fn insert_review(&self, review: NewReview) -> AppResult<Review>;

    fn find_review(&self, id: Uuid) -> AppResult<Option<Review>>;

    fn update_review(&self, id: Uuid, changes: &UpdateReview, now: DateTime<Utc>) -> AppResult<Review>;

    fn soft_delete_review(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Non-deleted reviews, newest first.
    fn list_reviews(&self, offset: i64, limit: i64) -> AppResult<Vec<Review>>;

    fn count_reviews(&self) -> AppResult<i64>;
}

