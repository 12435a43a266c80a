use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use amora_shared::clients::db::{DbConn, DbPool};
use amora_shared::errors::{AppError, AppResult};

use crate::models::{
    Block, Complaint, FilterPreference, Image, Like, Navigator, NewBlock, NewComplaint, NewFilter,
    NewImage, NewLike, NewNavigator, NewProfile, NewReview, Profile, Review, UpdateImage,
    UpdateProfile, UpdateReview,
};
use crate::schema::{
    profile_blocks, profile_complaints, profile_filters, profile_images, profile_likes,
    profile_navigators, profile_reviews, profiles,
};
use crate::services::distance::Point;

use super::{
    CandidateQuery, CandidateRow, ComplaintRecord, FilterValues, ImageRepository, LocationRepository,
    ProfileRepository, ReviewRepository, TrustRepository,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> AppResult<DbConn> {
        self.pool.get().map_err(|e| AppError::Internal(e.into()))
    }
}

fn new_filter(profile_id: Uuid, values: &FilterValues, now: DateTime<Utc>) -> NewFilter {
    NewFilter {
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

fn new_navigator(profile_id: Uuid, point: Point, now: DateTime<Utc>) -> NewNavigator {
    NewNavigator {
        id: Uuid::now_v7(),
        profile_id,
        latitude: point.latitude,
        longitude: point.longitude,
        created_at: now,
        updated_at: now,
    }
}

fn upsert_block(conn: &mut PgConnection, blocker_id: Uuid, blocked_id: Uuid, now: DateTime<Utc>) -> QueryResult<usize> {
    diesel::insert_into(profile_blocks::table)
        .values(&NewBlock {
            id: Uuid::now_v7(),
            profile_id: blocker_id,
            blocked_profile_id: blocked_id,
            is_blocked: true,
            created_at: now,
            updated_at: now,
        })
        .on_conflict((profile_blocks::profile_id, profile_blocks::blocked_profile_id))
        .do_update()
        .set((profile_blocks::is_blocked.eq(true), profile_blocks::updated_at.eq(now)))
        .execute(conn)
}

impl ProfileRepository for PgStore {
    fn create_profile(
        &self,
        profile: NewProfile,
        filter: &FilterValues,
        location: Option<Point>,
    ) -> AppResult<Profile> {
        let mut conn = self.conn()?;
        let now = profile.created_at;

        conn.transaction::<_, AppError, _>(|conn| {
            let created: Profile = diesel::insert_into(profiles::table)
                .values(&profile)
                .get_result(conn)?;

            diesel::insert_into(profile_filters::table)
                .values(&new_filter(created.id, filter, now))
                .execute(conn)?;

            if let Some(point) = location {
                diesel::insert_into(profile_navigators::table)
                    .values(&new_navigator(created.id, point, now))
                    .execute(conn)?;
            }

            Ok(created)
        })
    }

    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        Ok(profiles::table.find(id).first::<Profile>(&mut conn).optional()?)
    }

    fn find_profile_by_credential(&self, credential_id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        Ok(profiles::table
            .filter(profiles::credential_id.eq(credential_id))
            .first::<Profile>(&mut conn)
            .optional()?)
    }

    fn find_profile_by_telegram(&self, telegram_id: i64) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        Ok(profiles::table
            .filter(profiles::telegram_id.eq(telegram_id))
            .first::<Profile>(&mut conn)
            .optional()?)
    }

    fn update_profile(&self, id: Uuid, changes: &UpdateProfile, now: DateTime<Utc>) -> AppResult<Profile> {
        let mut conn = self.conn()?;
        Ok(diesel::update(profiles::table.find(id))
            .set((changes, profiles::updated_at.eq(now)))
            .get_result(&mut conn)?)
    }

    fn touch_last_online(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(profiles::table.find(id))
            .set(profiles::last_online.eq(now))
            .execute(&mut conn)?;
        Ok(())
    }

    fn set_profile_blocked(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(profiles::table.find(id))
            .set((profiles::is_blocked.eq(true), profiles::updated_at.eq(now)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn soft_delete_profile(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, AppError, _>(|conn| {
            diesel::update(profiles::table.find(id))
                .set((
                    profiles::is_deleted.eq(true),
                    profiles::display_name.eq(""),
                    profiles::description.eq(""),
                    profiles::location.eq(""),
                    profiles::telegram_id.eq(None::<i64>),
                    profiles::height.eq(None::<i32>),
                    profiles::weight.eq(None::<i32>),
                    profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

            diesel::update(profile_images::table.filter(profile_images::profile_id.eq(id)))
                .set((profile_images::is_deleted.eq(true), profile_images::updated_at.eq(now)))
                .execute(conn)?;

            diesel::update(profile_navigators::table.filter(profile_navigators::profile_id.eq(id)))
                .set((
                    profile_navigators::latitude.eq(0.0),
                    profile_navigators::longitude.eq(0.0),
                    profile_navigators::updated_at.eq(now),
                ))
                .execute(conn)?;

            diesel::update(profile_filters::table.filter(profile_filters::profile_id.eq(id)))
                .set((
                    profile_filters::search_gender.eq(""),
                    profile_filters::looking_for.eq(""),
                    profile_filters::age_from.eq(0),
                    profile_filters::age_to.eq(0),
                    profile_filters::distance_km.eq(0),
                    profile_filters::page.eq(0),
                    profile_filters::size.eq(0),
                    profile_filters::updated_at.eq(now),
                ))
                .execute(conn)?;

            Ok(())
        })
    }

    fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}

impl LocationRepository for PgStore {
    fn find_navigator(&self, profile_id: Uuid) -> AppResult<Option<Navigator>> {
        let mut conn = self.conn()?;
        Ok(profile_navigators::table
            .filter(profile_navigators::profile_id.eq(profile_id))
            .first::<Navigator>(&mut conn)
            .optional()?)
    }

    fn upsert_navigator(&self, profile_id: Uuid, point: Point, now: DateTime<Utc>) -> AppResult<Navigator> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(profile_navigators::table)
            .values(&new_navigator(profile_id, point, now))
            .on_conflict(profile_navigators::profile_id)
            .do_update()
            .set((
                profile_navigators::latitude.eq(point.latitude),
                profile_navigators::longitude.eq(point.longitude),
                profile_navigators::updated_at.eq(now),
            ))
            .get_result(&mut conn)?)
    }

    fn find_filter(&self, profile_id: Uuid) -> AppResult<Option<FilterPreference>> {
        let mut conn = self.conn()?;
        Ok(profile_filters::table
            .filter(profile_filters::profile_id.eq(profile_id))
            .first::<FilterPreference>(&mut conn)
            .optional()?)
    }

    fn upsert_filter(&self, profile_id: Uuid, values: &FilterValues, now: DateTime<Utc>) -> AppResult<FilterPreference> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(profile_filters::table)
            .values(&new_filter(profile_id, values, now))
            .on_conflict(profile_filters::profile_id)
            .do_update()
            .set((
                profile_filters::search_gender.eq(&values.search_gender),
                profile_filters::looking_for.eq(&values.looking_for),
                profile_filters::age_from.eq(values.age_from),
                profile_filters::age_to.eq(values.age_to),
                profile_filters::distance_km.eq(values.distance_km),
                profile_filters::page.eq(values.page),
                profile_filters::size.eq(values.size),
                profile_filters::updated_at.eq(now),
            ))
            .get_result(&mut conn)?)
    }

    fn candidates(&self, query: &CandidateQuery) -> AppResult<Vec<CandidateRow>> {
        let mut conn = self.conn()?;

        // Blocks are written in both directions, so the viewer's outgoing
        // edges cover mutual blocks as well as complaint blocks.
        let blocked_ids: Vec<Uuid> = profile_blocks::table
            .filter(profile_blocks::profile_id.eq(query.viewer_id))
            .filter(profile_blocks::is_blocked.eq(true))
            .select(profile_blocks::blocked_profile_id)
            .load(&mut conn)?;

        let mut sql = profiles::table
            .inner_join(profile_navigators::table)
            .filter(profiles::is_deleted.eq(false))
            .filter(profiles::is_blocked.eq(false))
            .filter(profiles::id.ne(query.viewer_id))
            .filter(profiles::id.ne_all(blocked_ids))
            .filter(profiles::birthday.between(query.birthdays.start.date(), query.birthdays.end.date()))
            .filter(profile_navigators::latitude.between(query.bbox.min_lat, query.bbox.max_lat))
            .filter(profile_navigators::longitude.between(query.bbox.min_lon, query.bbox.max_lon))
            .select((
                profiles::id,
                profiles::last_online,
                profiles::is_show_distance,
                profile_navigators::latitude,
                profile_navigators::longitude,
            ))
            .into_boxed();

        if let Some(gender) = &query.gender {
            sql = sql.filter(profiles::gender.eq(gender.clone()));
        }

        let rows: Vec<(Uuid, DateTime<Utc>, bool, f64, f64)> = sql.load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(profile_id, last_online, is_show_distance, latitude, longitude)| CandidateRow {
                profile_id,
                last_online,
                is_show_distance,
                location: Point::new(latitude, longitude),
            })
            .collect())
    }
}

impl TrustRepository for PgStore {
    fn find_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<Option<Like>> {
        let mut conn = self.conn()?;
        Ok(profile_likes::table
            .filter(profile_likes::profile_id.eq(liker_id))
            .filter(profile_likes::liked_profile_id.eq(liked_id))
            .first::<Like>(&mut conn)
            .optional()?)
    }

    fn find_like_by_id(&self, id: Uuid) -> AppResult<Option<Like>> {
        let mut conn = self.conn()?;
        Ok(profile_likes::table.find(id).first::<Like>(&mut conn).optional()?)
    }

    fn upsert_like(&self, liker_id: Uuid, liked_id: Uuid, is_liked: bool, now: DateTime<Utc>) -> AppResult<Like> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(profile_likes::table)
            .values(&NewLike {
                id: Uuid::now_v7(),
                profile_id: liker_id,
                liked_profile_id: liked_id,
                is_liked,
                created_at: now,
                updated_at: now,
            })
            .on_conflict((profile_likes::profile_id, profile_likes::liked_profile_id))
            .do_update()
            .set((profile_likes::is_liked.eq(is_liked), profile_likes::updated_at.eq(now)))
            .get_result(&mut conn)?)
    }

    fn find_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<Option<Block>> {
        let mut conn = self.conn()?;
        Ok(profile_blocks::table
            .filter(profile_blocks::profile_id.eq(blocker_id))
            .filter(profile_blocks::blocked_profile_id.eq(blocked_id))
            .first::<Block>(&mut conn)
            .optional()?)
    }

    fn block_mutual(&self, a: Uuid, b: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            upsert_block(conn, a, b, now)?;
            upsert_block(conn, b, a, now)?;
            Ok(())
        })
    }

    fn record_complaint(
        &self,
        complaint: NewComplaint,
        month_start: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<ComplaintRecord> {
        let mut conn = self.conn()?;
        let now = complaint.created_at;

        conn.transaction::<_, AppError, _>(|conn| {
            let complaint: Complaint = diesel::insert_into(profile_complaints::table)
                .values(&complaint)
                .get_result(conn)?;
            upsert_block(conn, complaint.profile_id, complaint.accused_profile_id, now)?;

            let complaints_this_month: i64 = profile_complaints::table
                .filter(profile_complaints::accused_profile_id.eq(complaint.accused_profile_id))
                .filter(profile_complaints::created_at.ge(month_start))
                .count()
                .get_result(conn)?;

            let mut accused_suspended = false;
            if complaints_this_month > limit {
                let flipped = diesel::update(
                    profiles::table
                        .filter(profiles::id.eq(complaint.accused_profile_id))
                        .filter(profiles::is_blocked.eq(false)),
                )
                .set((profiles::is_blocked.eq(true), profiles::updated_at.eq(now)))
                .execute(conn)?;
                accused_suspended = flipped == 1;
            }

            Ok(ComplaintRecord {
                complaint,
                complaints_this_month,
                accused_suspended,
            })
        })
    }
}

impl ImageRepository for PgStore {
    fn insert_image(&self, image: NewImage) -> AppResult<Image> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(profile_images::table)
            .values(&image)
            .get_result(&mut conn)?)
    }

    fn find_image(&self, id: Uuid) -> AppResult<Option<Image>> {
        let mut conn = self.conn()?;
        Ok(profile_images::table.find(id).first::<Image>(&mut conn).optional()?)
    }

    fn update_image(&self, id: Uuid, changes: &UpdateImage, now: DateTime<Utc>) -> AppResult<Image> {
        let mut conn = self.conn()?;

        conn.transaction::<_, AppError, _>(|conn| {
            if changes.is_primary == Some(true) {
                let owner: Uuid = profile_images::table
                    .find(id)
                    .select(profile_images::profile_id)
                    .first(conn)?;

                diesel::update(
                    profile_images::table
                        .filter(profile_images::profile_id.eq(owner))
                        .filter(profile_images::id.ne(id)),
                )
                .set(profile_images::is_primary.eq(false))
                .execute(conn)?;
            }

            Ok(diesel::update(profile_images::table.find(id))
                .set((changes, profile_images::updated_at.eq(now)))
                .get_result(conn)?)
        })
    }

    fn soft_delete_image(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Image>> {
        let mut conn = self.conn()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let before: Image = profile_images::table.find(id).first(conn)?;
            diesel::update(profile_images::table.find(id))
                .set((
                    profile_images::is_deleted.eq(true),
                    profile_images::is_primary.eq(false),
                    profile_images::updated_at.eq(now),
                ))
                .execute(conn)?;

            if !before.is_primary {
                return Ok(None);
            }

            let next = profile_images::table
                .filter(profile_images::profile_id.eq(before.profile_id))
                .filter(profile_images::is_deleted.eq(false))
                .filter(profile_images::is_blocked.eq(false))
                .filter(profile_images::is_private.eq(false))
                .order((profile_images::created_at.asc(), profile_images::id.asc()))
                .select(profile_images::id)
                .first::<Uuid>(conn)
                .optional()?;

            let Some(next) = next else {
                return Ok(None);
            };
            Ok(Some(
                diesel::update(profile_images::table.find(next))
                    .set((profile_images::is_primary.eq(true), profile_images::updated_at.eq(now)))
                    .get_result(conn)?,
            ))
        })
    }

    fn public_images(&self, profile_id: Uuid) -> AppResult<Vec<Image>> {
        let mut conn = self.conn()?;
        Ok(profile_images::table
            .filter(profile_images::profile_id.eq(profile_id))
            .filter(profile_images::is_deleted.eq(false))
            .filter(profile_images::is_blocked.eq(false))
            .filter(profile_images::is_private.eq(false))
            .order((profile_images::created_at.asc(), profile_images::id.asc()))
            .load::<Image>(&mut conn)?)
    }

    fn first_public_images(&self, profile_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Image>> {
        if profile_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.conn()?;
        let images = profile_images::table
            .filter(profile_images::profile_id.eq_any(profile_ids))
            .filter(profile_images::is_deleted.eq(false))
            .filter(profile_images::is_blocked.eq(false))
            .filter(profile_images::is_private.eq(false))
            .order((profile_images::created_at.asc(), profile_images::id.asc()))
            .load::<Image>(&mut conn)?;

        let mut first = HashMap::with_capacity(profile_ids.len());
        for image in images {
            first.entry(image.profile_id).or_insert(image);
        }
        Ok(first)
    }
}

impl ReviewRepository for PgStore {
    fn insert_review(&self, review: NewReview) -> AppResult<Review> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(profile_reviews::table)
            .values(&review)
            .get_result(&mut conn)?)
    }

    fn find_review(&self, id: Uuid) -> AppResult<Option<Review>> {
        let mut conn = self.conn()?;
        Ok(profile_reviews::table.find(id).first::<Review>(&mut conn).optional()?)
    }

    fn update_review(&self, id: Uuid, changes: &UpdateReview, now: DateTime<Utc>) -> AppResult<Review> {
        let mut conn = self.conn()?;
        Ok(diesel::update(profile_reviews::table.find(id))
            .set((
                changes,
                profile_reviews::has_edited.eq(true),
                profile_reviews::updated_at.eq(now),
            ))
            .get_result(&mut conn)?)
    }

    fn soft_delete_review(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(profile_reviews::table.find(id))
            .set((profile_reviews::has_deleted.eq(true), profile_reviews::updated_at.eq(now)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_reviews(&self, offset: i64, limit: i64) -> AppResult<Vec<Review>> {
        let mut conn = self.conn()?;
        Ok(profile_reviews::table
            .filter(profile_reviews::has_deleted.eq(false))
            .order((profile_reviews::created_at.desc(), profile_reviews::id.desc()))
            .offset(offset)
            .limit(limit)
            .load::<Review>(&mut conn)?)
    }

    fn count_reviews(&self) -> AppResult<i64> {
        let mut conn = self.conn()?;
        Ok(profile_reviews::table
            .filter(profile_reviews::has_deleted.eq(false))
            .count()
            .get_result(&mut conn)?)
    }
}
