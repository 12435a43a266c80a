use chrono::{DateTime, Utc};

use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{FilterPreference, Navigator, Profile};
use crate::repository::{FilterValues, LocationRepository};
use crate::services::discovery::validate_filter;
use crate::services::distance::Point;
use crate::services::profile_service::ensure_active;

pub fn set_location<S>(store: &S, profile: &Profile, point: Point, now: DateTime<Utc>) -> AppResult<Navigator>
where
    S: LocationRepository + ?Sized,
{
    ensure_active(profile)?;
    let navigator = store.upsert_navigator(profile.id, point, now)?;
    tracing::debug!(profile_id = %profile.id, "navigator updated");
    Ok(navigator)
}

pub fn saved_filter<S>(store: &S, profile: &Profile) -> AppResult<FilterPreference>
where
    S: LocationRepository + ?Sized,
{
    store
        .find_filter(profile.id)?
        .ok_or_else(|| AppError::new(ErrorCode::NotFound, "no saved filter for this profile"))
}

/// Replaces the saved filter wholesale, with the same bounds discovery applies.
pub fn replace_filter<S>(
    store: &S,
    profile: &Profile,
    values: FilterValues,
    now: DateTime<Utc>,
) -> AppResult<FilterPreference>
where
    S: LocationRepository + ?Sized,
{
    ensure_active(profile)?;
    validate_filter(&values)?;
    store.upsert_filter(profile.id, &values, now)
}
