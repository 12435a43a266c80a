use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{
    FilterPreference, Gender, Image, Like, Navigator, NewProfile, Profile, SearchGender,
    UpdateProfile,
};
use crate::repository::{FilterValues, ImageRepository, LocationRepository, ProfileRepository, TrustRepository};
use crate::services::discovery::{self, MIN_AGE};
use crate::services::distance::Point;
use crate::services::trust;

/// Rejects mutations by or against a deleted or suspended profile.
pub fn ensure_active(profile: &Profile) -> AppResult<()> {
    if profile.is_deleted {
        return Err(AppError::new(ErrorCode::ProfileDeleted, "profile has been deleted"));
    }
    if profile.is_blocked {
        return Err(AppError::new(ErrorCode::ProfileBlocked, "profile is blocked"));
    }
    Ok(())
}

/// Full years between `birthday` and `today`.
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

/// Looks up the caller's profile and refreshes its `last_online`.
pub fn resolve_caller<S>(store: &S, credential_id: Uuid, now: DateTime<Utc>) -> AppResult<Profile>
where
    S: ProfileRepository + ?Sized,
{
    let mut profile = store
        .find_profile_by_credential(credential_id)?
        .ok_or_else(AppError::profile_not_found)?;

    if !profile.is_deleted {
        store.touch_last_online(profile.id, now)?;
        profile.last_online = now;
    }
    Ok(profile)
}

#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub credential_id: Uuid,
    pub telegram_id: Option<i64>,
    pub display_name: String,
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub search_gender: SearchGender,
    pub looking_for: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub description: String,
    pub location: String,
    pub is_show_distance: bool,
    pub filter: FilterValues,
    pub coordinates: Option<Point>,
}

pub fn create_profile<S>(store: &S, input: CreateProfile, now: DateTime<Utc>) -> AppResult<Profile>
where
    S: ProfileRepository + ?Sized,
{
    if age_on(input.birthday, now.date_naive()) < MIN_AGE {
        return Err(AppError::invalid_field(
            ErrorCode::ValidationError,
            "birthday",
            format!("profiles require an age of at least {MIN_AGE}"),
        ));
    }
    discovery::validate_filter(&input.filter)?;

    if store.find_profile_by_credential(input.credential_id)?.is_some() {
        return Err(AppError::new(ErrorCode::ProfileAlreadyExists, "a profile already exists for this account"));
    }
    if let Some(telegram_id) = input.telegram_id {
        ensure_telegram_free(store, telegram_id, None)?;
    }

    let profile = store.create_profile(
        NewProfile {
            id: Uuid::now_v7(),
            credential_id: input.credential_id,
            telegram_id: input.telegram_id,
            display_name: input.display_name,
            birthday: input.birthday,
            gender: input.gender.as_str().to_string(),
            search_gender: input.search_gender.as_str().to_string(),
            looking_for: input.looking_for,
            height: input.height,
            weight: input.weight,
            description: input.description,
            location: input.location,
            is_show_distance: input.is_show_distance,
            created_at: now,
            updated_at: now,
            last_online: now,
        },
        &input.filter,
        input.coordinates,
    )?;

    tracing::info!(profile_id = %profile.id, credential_id = %profile.credential_id, "profile created");
    Ok(profile)
}

fn ensure_telegram_free<S>(store: &S, telegram_id: i64, owner: Option<Uuid>) -> AppResult<()>
where
    S: ProfileRepository + ?Sized,
{
    match store.find_profile_by_telegram(telegram_id)? {
        Some(existing) if Some(existing.id) != owner => Err(AppError::invalid_field(
            ErrorCode::ProfileAlreadyExists,
            "telegramId",
            "telegram id is linked to another profile",
        )),
        _ => Ok(()),
    }
}

pub fn update_profile<S>(store: &S, profile: &Profile, changes: UpdateProfile, now: DateTime<Utc>) -> AppResult<Profile>
where
    S: ProfileRepository + ?Sized,
{
    ensure_active(profile)?;

    if let Some(birthday) = changes.birthday {
        if age_on(birthday, now.date_naive()) < MIN_AGE {
            return Err(AppError::invalid_field(
                ErrorCode::ValidationError,
                "birthday",
                format!("profiles require an age of at least {MIN_AGE}"),
            ));
        }
    }
    if let Some(telegram_id) = changes.telegram_id {
        ensure_telegram_free(store, telegram_id, Some(profile.id))?;
    }

    let updated = store.update_profile(profile.id, &changes, now)?;
    tracing::debug!(profile_id = %profile.id, "profile updated");
    Ok(updated)
}

pub fn delete_profile<S>(store: &S, profile: &Profile, now: DateTime<Utc>) -> AppResult<()>
where
    S: ProfileRepository + ?Sized,
{
    if profile.is_deleted {
        return Err(AppError::new(ErrorCode::ProfileDeleted, "profile has already been deleted"));
    }
    store.soft_delete_profile(profile.id, now)?;
    tracing::info!(profile_id = %profile.id, "profile soft-deleted");
    Ok(())
}

/// The caller's own profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub filter: Option<FilterPreference>,
    pub navigator: Option<Navigator>,
    pub images: Vec<Image>,
}

pub fn own_profile<S>(store: &S, profile: Profile) -> AppResult<OwnProfile>
where
    S: LocationRepository + ImageRepository + ?Sized,
{
    Ok(OwnProfile {
        filter: store.find_filter(profile.id)?,
        navigator: store.find_navigator(profile.id)?,
        images: store.public_images(profile.id)?,
        profile,
    })
}

/// Another profile as seen by a viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetail {
    pub id: Uuid,
    pub display_name: String,
    pub age: i32,
    pub gender: String,
    pub looking_for: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub description: String,
    pub location: String,
    pub is_premium: bool,
    pub is_blocked: bool,
    pub is_deleted: bool,
    pub is_online: bool,
    pub last_online: DateTime<Utc>,
    pub images: Vec<Image>,
    pub like: Option<Like>,
    /// Meters between viewer and target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

pub fn profile_detail<S>(
    store: &S,
    viewer: &Profile,
    target: Profile,
    viewer_location: Option<Point>,
    now: DateTime<Utc>,
) -> AppResult<ProfileDetail>
where
    S: LocationRepository + ImageRepository + TrustRepository + ?Sized,
{
    if let Some(point) = viewer_location {
        store.upsert_navigator(viewer.id, point, now)?;
    }

    let like = trust::like_status_for(store, viewer.id, target.id)?;
    let distance = discovery::distance_between(store, viewer.id, &target)?;
    let images = store.public_images(target.id)?;

    Ok(ProfileDetail {
        id: target.id,
        age: age_on(target.birthday, now.date_naive()),
        is_online: target.is_online(now),
        display_name: target.display_name,
        gender: target.gender,
        looking_for: target.looking_for,
        height: target.height,
        weight: target.weight,
        description: target.description,
        location: target.location,
        is_premium: target.is_premium,
        is_blocked: target.is_blocked,
        is_deleted: target.is_deleted,
        last_online: target.last_online,
        images,
        like,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewImage;
    use crate::repository::memory::MemoryStore;
    use chrono::Duration;

    fn input(credential_id: Uuid) -> CreateProfile {
        CreateProfile {
            credential_id,
            telegram_id: Some(42),
            display_name: "Ana".into(),
            birthday: NaiveDate::from_ymd_opt(1996, 8, 20).unwrap(),
            gender: Gender::Woman,
            search_gender: SearchGender::Man,
            looking_for: "relationship".into(),
            height: Some(168),
            weight: None,
            description: "hi".into(),
            location: "Lisbon".into(),
            is_show_distance: true,
            filter: FilterValues::default(),
            coordinates: Some(Point::new(38.72, -9.14)),
        }
    }

    #[test]
    fn age_counts_full_years() {
        let birthday = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
        assert_eq!(age_on(birthday, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()), 23);
        assert_eq!(age_on(birthday, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), 24);
        assert_eq!(age_on(birthday, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 24);
    }

    #[test]
    fn create_writes_filter_and_navigator() {
        let store = MemoryStore::new();
        let profile = create_profile(&store, input(Uuid::now_v7()), Utc::now()).unwrap();

        assert_eq!(profile.gender, "woman");
        assert_eq!(store.find_filter(profile.id).unwrap().unwrap().age_to, FilterValues::default().age_to);
        assert_eq!(store.find_navigator(profile.id).unwrap().unwrap().latitude, 38.72);
        assert_eq!(store.find_profile_by_telegram(42).unwrap().map(|p| p.id), Some(profile.id));
    }

    #[test]
    fn create_rejects_duplicates_and_minors() {
        let store = MemoryStore::new();
        let credential = Uuid::now_v7();
        create_profile(&store, input(credential), Utc::now()).unwrap();

        let err = create_profile(&store, input(credential), Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileAlreadyExists);

        let err = create_profile(&store, input(Uuid::now_v7()), Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileAlreadyExists, "telegram id already linked");

        let mut minor = input(Uuid::now_v7());
        minor.telegram_id = None;
        minor.birthday = Utc::now().date_naive() - Duration::days(365 * 10);
        assert_eq!(create_profile(&store, minor, Utc::now()).unwrap_err().code(), ErrorCode::ValidationError);
    }

    #[test]
    fn resolve_caller_refreshes_last_online() {
        let store = MemoryStore::new();
        let profile = create_profile(&store, input(Uuid::now_v7()), Utc::now() - Duration::hours(2)).unwrap();
        assert!(!profile.is_online(Utc::now()));

        let now = Utc::now();
        let caller = resolve_caller(&store, profile.credential_id, now).unwrap();

        assert_eq!(caller.last_online, now);
        assert_eq!(store.profile(profile.id).last_online, now);
        assert_eq!(
            resolve_caller(&store, Uuid::now_v7(), now).unwrap_err().code(),
            ErrorCode::ProfileNotFound
        );
    }

    #[test]
    fn soft_delete_blanks_and_zeroes_everything() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let profile = create_profile(&store, input(Uuid::now_v7()), now).unwrap();
        store
            .insert_image(NewImage {
                id: Uuid::now_v7(),
                profile_id: profile.id,
                name: "a.jpg".into(),
                url: "http://img/a".into(),
                object_key: "a".into(),
                size: 1,
                is_primary: true,
                is_private: false,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        delete_profile(&store, &profile, now).unwrap();

        let deleted = store.profile(profile.id);
        assert!(deleted.is_deleted);
        assert!(deleted.display_name.is_empty());
        assert_eq!(deleted.telegram_id, None);
        assert!(store.public_images(profile.id).unwrap().is_empty());
        let nav = store.find_navigator(profile.id).unwrap().unwrap();
        assert_eq!((nav.latitude, nav.longitude), (0.0, 0.0));
        assert_eq!(store.find_filter(profile.id).unwrap().unwrap().distance_km, 0);

        let err = delete_profile(&store, &deleted, now).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileDeleted);
    }

    #[test]
    fn update_is_refused_for_suspended_profiles() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let profile = create_profile(&store, input(Uuid::now_v7()), now).unwrap();

        let changes = UpdateProfile { description: Some("new".into()), ..Default::default() };
        let updated = update_profile(&store, &profile, changes.clone(), now).unwrap();
        assert_eq!(updated.description, "new");

        store.set_profile_blocked(profile.id, now).unwrap();
        let err = update_profile(&store, &store.profile(profile.id), changes, now).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileBlocked);
    }

    #[test]
    fn detail_shows_like_distance_and_updates_viewer_location() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let target = create_profile(&store, input(Uuid::now_v7()), now).unwrap();
        let mut viewer_input = input(Uuid::now_v7());
        viewer_input.telegram_id = None;
        viewer_input.coordinates = None;
        let viewer = create_profile(&store, viewer_input, now).unwrap();

        let detail = profile_detail(&store, &viewer, store.profile(target.id), None, now).unwrap();
        assert!(detail.distance.is_none());
        assert!(detail.like.is_none());

        trust::like(&store, &viewer, target.id, now).unwrap();
        let detail = profile_detail(&store, &viewer, store.profile(target.id), Some(Point::new(38.73, -9.14)), now).unwrap();

        assert!(detail.like.is_some_and(|l| l.is_liked));
        let d = detail.distance.unwrap();
        assert!((d - 1_113.0).abs() < 5.0, "got {d}");
        assert!(detail.is_online);
        assert_eq!(detail.age, age_on(target.birthday, now.date_naive()));
    }
}
