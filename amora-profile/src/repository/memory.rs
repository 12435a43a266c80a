//! In-memory store used by unit tests. Mirrors the Postgres predicates.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult};

use crate::models::{
    Block, Complaint, FilterPreference, Gender, Image, Like, Navigator, NewComplaint, NewImage, NewProfile,
    NewReview, Profile, Review, UpdateImage, UpdateProfile, UpdateReview,
};
use crate::services::distance::Point;

use super::{
    CandidateQuery, CandidateRow, ComplaintRecord, FilterValues, ImageRepository, LocationRepository,
    ProfileRepository, ReviewRepository, TrustRepository,
};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    navigators: Vec<Navigator>,
    filters: Vec<FilterPreference>,
    images: Vec<Image>,
    likes: Vec<Like>,
    blocks: Vec<Block>,
    complaints: Vec<Complaint>,
    reviews: Vec<Review>,
    fail_complaint_writes: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn not_found() -> AppError {
    AppError::Database(diesel::result::Error::NotFound)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    /// Overwrites `last_online` without going through the service layer.
    pub fn set_last_online(&self, id: Uuid, at: DateTime<Utc>) {
        self.with(|t| {
            if let Some(p) = t.profiles.iter_mut().find(|p| p.id == id) {
                p.last_online = at;
            }
        })
    }

    pub fn set_show_distance(&self, id: Uuid, show: bool) {
        self.with(|t| {
            if let Some(p) = t.profiles.iter_mut().find(|p| p.id == id) {
                p.is_show_distance = show;
            }
        })
    }

    /// Inserts a profile with a default filter, optionally located.
    pub fn seed(&self, gender: Gender, birthday: NaiveDate, at: Option<Point>) -> Profile {
        let now = Utc::now();
        let profile = NewProfile {
            id: Uuid::now_v7(),
            credential_id: Uuid::now_v7(),
            telegram_id: None,
            display_name: "seed".into(),
            birthday,
            gender: gender.as_str().into(),
            search_gender: "all".into(),
            looking_for: String::new(),
            height: None,
            weight: None,
            description: String::new(),
            location: String::new(),
            is_show_distance: true,
            created_at: now,
            updated_at: now,
            last_online: now,
        };
        self.create_profile(profile, &FilterValues::default(), at).unwrap()
    }

    pub fn profile(&self, id: Uuid) -> Profile {
        self.find_profile(id).unwrap().unwrap()
    }

    pub fn like_edge_count(&self) -> usize {
        self.with(|t| t.likes.len())
    }

    pub fn complaint_count(&self) -> usize {
        self.with(|t| t.complaints.len())
    }

    /// Makes every later complaint write fail before anything is stored.
    pub fn fail_complaint_writes(&self) {
        self.with(|t| t.fail_complaint_writes = true)
    }

    pub fn block_edge_count(&self) -> usize {
        self.with(|t| t.blocks.len())
    }

    pub fn backdate_complaints(&self, accused_id: Uuid, at: DateTime<Utc>) {
        self.with(|t| {
            for c in t.complaints.iter_mut().filter(|c| c.accused_profile_id == accused_id) {
                c.created_at = at;
            }
        })
    }
}

fn upsert_block(t: &mut Tables, blocker_id: Uuid, blocked_id: Uuid, now: DateTime<Utc>) {
    match t
        .blocks
        .iter_mut()
        .find(|b| b.profile_id == blocker_id && b.blocked_profile_id == blocked_id)
    {
        Some(edge) => {
            edge.is_blocked = true;
            edge.updated_at = now;
        }
        None => t.blocks.push(Block {
            id: Uuid::now_v7(),
            profile_id: blocker_id,
            blocked_profile_id: blocked_id,
            is_blocked: true,
            created_at: now,
            updated_at: now,
        }),
    }
}

fn filter_row(profile_id: Uuid, values: &FilterValues, now: DateTime<Utc>) -> FilterPreference {
    FilterPreference {
        id: Uuid::now_v7(),
        profile_id,
        search_gender: values.search_gender.clone(),
        looking_for: values.looking_for.clone(),
        age_from: values.age_from,
        age_to: values.age_to,
        distance_km: values.distance_km,
        page: values.page,
        size: values.size,
        created_at: now,
        updated_at: now,
    }
}

fn upsert_navigator(t: &mut Tables, profile_id: Uuid, point: Point, now: DateTime<Utc>) -> Navigator {
    match t.navigators.iter_mut().find(|n| n.profile_id == profile_id) {
        Some(nav) => {
            nav.latitude = point.latitude;
            nav.longitude = point.longitude;
            nav.updated_at = now;
            nav.clone()
        }
        None => {
            let nav = Navigator {
                id: Uuid::now_v7(),
                profile_id,
                latitude: point.latitude,
                longitude: point.longitude,
                created_at: now,
                updated_at: now,
            };
            t.navigators.push(nav.clone());
            nav
        }
    }
}

impl ProfileRepository for MemoryStore {
    fn create_profile(
        &self,
        profile: NewProfile,
        filter: &FilterValues,
        location: Option<Point>,
    ) -> AppResult<Profile> {
        self.with(|t| {
            let created = Profile {
                id: profile.id,
                credential_id: profile.credential_id,
                telegram_id: profile.telegram_id,
                display_name: profile.display_name,
                birthday: profile.birthday,
                gender: profile.gender,
                search_gender: profile.search_gender,
                looking_for: profile.looking_for,
                height: profile.height,
                weight: profile.weight,
                description: profile.description,
                location: profile.location,
                is_deleted: false,
                is_blocked: false,
                is_premium: false,
                is_show_distance: profile.is_show_distance,
                is_invisible: false,
                created_at: profile.created_at,
                updated_at: profile.updated_at,
                last_online: profile.last_online,
            };
            t.profiles.push(created.clone());
            t.filters.push(filter_row(created.id, filter, created.created_at));
            if let Some(point) = location {
                upsert_navigator(t, created.id, point, created.created_at);
            }
            Ok(created)
        })
    }

    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.with(|t| t.profiles.iter().find(|p| p.id == id).cloned()))
    }

    fn find_profile_by_credential(&self, credential_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.with(|t| t.profiles.iter().find(|p| p.credential_id == credential_id).cloned()))
    }

    fn find_profile_by_telegram(&self, telegram_id: i64) -> AppResult<Option<Profile>> {
        Ok(self.with(|t| t.profiles.iter().find(|p| p.telegram_id == Some(telegram_id)).cloned()))
    }

    fn update_profile(&self, id: Uuid, changes: &UpdateProfile, now: DateTime<Utc>) -> AppResult<Profile> {
        self.with(|t| {
            let p = t.profiles.iter_mut().find(|p| p.id == id).ok_or_else(not_found)?;
            let c = changes.clone();
            if let Some(v) = c.telegram_id { p.telegram_id = Some(v); }
            if let Some(v) = c.display_name { p.display_name = v; }
            if let Some(v) = c.birthday { p.birthday = v; }
            if let Some(v) = c.gender { p.gender = v; }
            if let Some(v) = c.search_gender { p.search_gender = v; }
            if let Some(v) = c.looking_for { p.looking_for = v; }
            if let Some(v) = c.height { p.height = Some(v); }
            if let Some(v) = c.weight { p.weight = Some(v); }
            if let Some(v) = c.description { p.description = v; }
            if let Some(v) = c.location { p.location = v; }
            if let Some(v) = c.is_show_distance { p.is_show_distance = v; }
            if let Some(v) = c.is_invisible { p.is_invisible = v; }
            p.updated_at = now;
            Ok(p.clone())
        })
    }

    fn touch_last_online(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.set_last_online(id, now);
        Ok(())
    }

    fn set_profile_blocked(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.with(|t| {
            if let Some(p) = t.profiles.iter_mut().find(|p| p.id == id) {
                p.is_blocked = true;
                p.updated_at = now;
            }
        });
        Ok(())
    }

    fn soft_delete_profile(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.with(|t| {
            if let Some(p) = t.profiles.iter_mut().find(|p| p.id == id) {
                p.is_deleted = true;
                p.display_name.clear();
                p.description.clear();
                p.location.clear();
                p.telegram_id = None;
                p.height = None;
                p.weight = None;
                p.updated_at = now;
            }
            for img in t.images.iter_mut().filter(|i| i.profile_id == id) {
                img.is_deleted = true;
            }
            for nav in t.navigators.iter_mut().filter(|n| n.profile_id == id) {
                nav.latitude = 0.0;
                nav.longitude = 0.0;
            }
            for f in t.filters.iter_mut().filter(|f| f.profile_id == id) {
                f.search_gender.clear();
                f.looking_for.clear();
                f.age_from = 0;
                f.age_to = 0;
                f.distance_km = 0;
                f.page = 0;
                f.size = 0;
            }
        });
        Ok(())
    }

    fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

impl LocationRepository for MemoryStore {
    fn find_navigator(&self, profile_id: Uuid) -> AppResult<Option<Navigator>> {
        Ok(self.with(|t| t.navigators.iter().find(|n| n.profile_id == profile_id).cloned()))
    }

    fn upsert_navigator(&self, profile_id: Uuid, point: Point, now: DateTime<Utc>) -> AppResult<Navigator> {
        Ok(self.with(|t| upsert_navigator(t, profile_id, point, now)))
    }

    fn find_filter(&self, profile_id: Uuid) -> AppResult<Option<FilterPreference>> {
        Ok(self.with(|t| t.filters.iter().find(|f| f.profile_id == profile_id).cloned()))
    }

    fn upsert_filter(&self, profile_id: Uuid, values: &FilterValues, now: DateTime<Utc>) -> AppResult<FilterPreference> {
        Ok(self.with(|t| match t.filters.iter_mut().find(|f| f.profile_id == profile_id) {
            Some(f) => {
                let id = f.id;
                let created_at = f.created_at;
                *f = FilterPreference { id, created_at, ..filter_row(profile_id, values, now) };
                f.clone()
            }
            None => {
                let f = filter_row(profile_id, values, now);
                t.filters.push(f.clone());
                f
            }
        }))
    }

    fn candidates(&self, query: &CandidateQuery) -> AppResult<Vec<CandidateRow>> {
        Ok(self.with(|t| {
            let blocked: Vec<Uuid> = t
                .blocks
                .iter()
                .filter(|b| b.profile_id == query.viewer_id && b.is_blocked)
                .map(|b| b.blocked_profile_id)
                .collect();

            t.profiles
                .iter()
                .filter(|p| !p.is_deleted && !p.is_blocked)
                .filter(|p| p.id != query.viewer_id && !blocked.contains(&p.id))
                .filter(|p| query.birthdays.contains(p.birthday))
                .filter(|p| query.gender.as_ref().map_or(true, |g| &p.gender == g))
                .filter_map(|p| {
                    let nav = t.navigators.iter().find(|n| n.profile_id == p.id)?;
                    let location = Point::new(nav.latitude, nav.longitude);
                    query.bbox.contains(location).then(|| CandidateRow {
                        profile_id: p.id,
                        last_online: p.last_online,
                        is_show_distance: p.is_show_distance,
                        location,
                    })
                })
                .collect()
        }))
    }
}

impl TrustRepository for MemoryStore {
    fn find_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<Option<Like>> {
        Ok(self.with(|t| {
            t.likes
                .iter()
                .find(|l| l.profile_id == liker_id && l.liked_profile_id == liked_id)
                .cloned()
        }))
    }

    fn find_like_by_id(&self, id: Uuid) -> AppResult<Option<Like>> {
        Ok(self.with(|t| t.likes.iter().find(|l| l.id == id).cloned()))
    }

    fn upsert_like(&self, liker_id: Uuid, liked_id: Uuid, is_liked: bool, now: DateTime<Utc>) -> AppResult<Like> {
        Ok(self.with(|t| {
            match t
                .likes
                .iter_mut()
                .find(|l| l.profile_id == liker_id && l.liked_profile_id == liked_id)
            {
                Some(edge) => {
                    edge.is_liked = is_liked;
                    edge.updated_at = now;
                    edge.clone()
                }
                None => {
                    let edge = Like {
                        id: Uuid::now_v7(),
                        profile_id: liker_id,
                        liked_profile_id: liked_id,
                        is_liked,
                        created_at: now,
                        updated_at: now,
                    };
                    t.likes.push(edge.clone());
                    edge
                }
            }
        }))
    }

    fn find_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<Option<Block>> {
        Ok(self.with(|t| {
            t.blocks
                .iter()
                .find(|b| b.profile_id == blocker_id && b.blocked_profile_id == blocked_id)
                .cloned()
        }))
    }

    fn block_mutual(&self, a: Uuid, b: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.with(|t| {
            upsert_block(t, a, b, now);
            upsert_block(t, b, a, now);
        });
        Ok(())
    }

    fn record_complaint(
        &self,
        complaint: NewComplaint,
        month_start: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<ComplaintRecord> {
        self.with(|t| {
            if t.fail_complaint_writes {
                return Err(AppError::internal("complaint write failed"));
            }
            let now = complaint.created_at;
            let row = Complaint {
                id: complaint.id,
                profile_id: complaint.profile_id,
                accused_profile_id: complaint.accused_profile_id,
                reason: complaint.reason,
                created_at: complaint.created_at,
            };
            t.complaints.push(row.clone());
            upsert_block(t, row.profile_id, row.accused_profile_id, now);

            let complaints_this_month = t
                .complaints
                .iter()
                .filter(|c| c.accused_profile_id == row.accused_profile_id && c.created_at >= month_start)
                .count() as i64;

            let mut accused_suspended = false;
            if complaints_this_month > limit {
                if let Some(p) = t.profiles.iter_mut().find(|p| p.id == row.accused_profile_id && !p.is_blocked) {
                    p.is_blocked = true;
                    p.updated_at = now;
                    accused_suspended = true;
                }
            }

            Ok(ComplaintRecord {
                complaint: row,
                complaints_this_month,
                accused_suspended,
            })
        })
    }
}

impl ImageRepository for MemoryStore {
    fn insert_image(&self, image: NewImage) -> AppResult<Image> {
        Ok(self.with(|t| {
            let row = Image {
                id: image.id,
                profile_id: image.profile_id,
                name: image.name,
                url: image.url,
                object_key: image.object_key,
                size: image.size,
                is_primary: image.is_primary,
                is_private: image.is_private,
                is_blocked: false,
                is_deleted: false,
                created_at: image.created_at,
                updated_at: image.updated_at,
            };
            t.images.push(row.clone());
            row
        }))
    }

    fn find_image(&self, id: Uuid) -> AppResult<Option<Image>> {
        Ok(self.with(|t| t.images.iter().find(|i| i.id == id).cloned()))
    }

    fn update_image(&self, id: Uuid, changes: &UpdateImage, now: DateTime<Utc>) -> AppResult<Image> {
        self.with(|t| {
            let owner = t.images.iter().find(|i| i.id == id).ok_or_else(not_found)?.profile_id;
            if changes.is_primary == Some(true) {
                for other in t.images.iter_mut().filter(|i| i.profile_id == owner && i.id != id) {
                    other.is_primary = false;
                }
            }
            let img = t.images.iter_mut().find(|i| i.id == id).ok_or_else(not_found)?;
            if let Some(v) = changes.is_primary { img.is_primary = v; }
            if let Some(v) = changes.is_private { img.is_private = v; }
            img.updated_at = now;
            Ok(img.clone())
        })
    }

    fn soft_delete_image(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Image>> {
        self.with(|t| {
            let img = t.images.iter_mut().find(|i| i.id == id).ok_or_else(not_found)?;
            let (owner, was_primary) = (img.profile_id, img.is_primary);
            img.is_deleted = true;
            img.is_primary = false;
            img.updated_at = now;

            if !was_primary {
                return Ok(None);
            }
            let next = t
                .images
                .iter_mut()
                .filter(|i| i.profile_id == owner && i.is_public())
                .min_by_key(|i| (i.created_at, i.id));
            Ok(next.map(|i| {
                i.is_primary = true;
                i.updated_at = now;
                i.clone()
            }))
        })
    }

    fn public_images(&self, profile_id: Uuid) -> AppResult<Vec<Image>> {
        Ok(self.with(|t| {
            let mut images: Vec<Image> = t
                .images
                .iter()
                .filter(|i| i.profile_id == profile_id && i.is_public())
                .cloned()
                .collect();
            images.sort_by_key(|i| (i.created_at, i.id));
            images
        }))
    }

    fn first_public_images(&self, profile_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Image>> {
        let mut first = HashMap::new();
        for id in profile_ids {
            if let Some(image) = self.public_images(*id)?.into_iter().next() {
                first.insert(*id, image);
            }
        }
        Ok(first)
    }
}

impl ReviewRepository for MemoryStore {
    fn insert_review(&self, review: NewReview) -> AppResult<Review> {
        Ok(self.with(|t| {
            let row = Review {
                id: review.id,
                profile_id: review.profile_id,
                message: review.message,
                rating: review.rating,
                has_deleted: false,
                has_edited: false,
                created_at: review.created_at,
                updated_at: review.updated_at,
            };
            t.reviews.push(row.clone());
            row
        }))
    }

    fn find_review(&self, id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.with(|t| t.reviews.iter().find(|r| r.id == id).cloned()))
    }

    fn update_review(&self, id: Uuid, changes: &UpdateReview, now: DateTime<Utc>) -> AppResult<Review> {
        self.with(|t| {
            let r = t.reviews.iter_mut().find(|r| r.id == id).ok_or_else(not_found)?;
            if let Some(v) = &changes.message { r.message = v.clone(); }
            if let Some(v) = changes.rating { r.rating = v; }
            r.has_edited = true;
            r.updated_at = now;
            Ok(r.clone())
        })
    }

    fn soft_delete_review(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.with(|t| {
            if let Some(r) = t.reviews.iter_mut().find(|r| r.id == id) {
                r.has_deleted = true;
                r.updated_at = now;
            }
        });
        Ok(())
    }

    fn list_reviews(&self, offset: i64, limit: i64) -> AppResult<Vec<Review>> {
        Ok(self.with(|t| {
            let mut live: Vec<Review> = t.reviews.iter().filter(|r| !r.has_deleted).cloned().collect();
            live.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            live.into_iter().skip(offset as usize).take(limit as usize).collect()
        }))
    }

    fn count_reviews(&self) -> AppResult<i64> {
        Ok(self.with(|t| t.reviews.iter().filter(|r| !r.has_deleted).count() as i64))
    }
}
