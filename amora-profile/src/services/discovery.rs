//! Candidate selection: turns a viewer's location and saved preferences
//! into a ranked, paginated page of other profiles.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE};

use crate::models::{self, FilterPreference, Image, Profile, SearchGender};
use crate::repository::{
    CandidateQuery, FilterValues, ImageRepository, LocationRepository, ProfileRepository,
};
use crate::services::distance::{distance_m, km_to_m, BoundingBox, Point};
use crate::services::profile_service::ensure_active;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 100;
pub const MAX_DISTANCE_KM: i32 = 20_000;

pub const DEFAULT_AGE_FROM: i32 = 18;
pub const DEFAULT_AGE_TO: i32 = 35;
pub const DEFAULT_DISTANCE_KM: i32 = 50;

impl Default for FilterValues {
    fn default() -> Self {
        Self {
            search_gender: SearchGender::All.as_str().to_string(),
            looking_for: String::new(),
            age_from: DEFAULT_AGE_FROM,
            age_to: DEFAULT_AGE_TO,
            distance_km: DEFAULT_DISTANCE_KM,
            page: 1,
            size: DEFAULT_PAGE_SIZE as i32,
        }
    }
}

impl From<&FilterPreference> for FilterValues {
    fn from(f: &FilterPreference) -> Self {
        Self {
            search_gender: f.search_gender.clone(),
            looking_for: f.looking_for.clone(),
            age_from: f.age_from,
            age_to: f.age_to,
            distance_km: f.distance_km,
            page: f.page,
            size: f.size,
        }
    }
}

/// Discovery request values that replace the stored preference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOverride {
    pub location: Option<Point>,
    pub search_gender: Option<SearchGender>,
    pub looking_for: Option<String>,
    pub age_from: Option<i32>,
    pub age_to: Option<i32>,
    pub distance_km: Option<i32>,
    pub page: Option<i32>,
    pub size: Option<i32>,
}

/// Raw query-string values. Every field is parsed explicitly so a
/// malformed number rejects the request instead of falling back to a default.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilter {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub age_from: Option<String>,
    pub age_to: Option<String>,
    pub search_gender: Option<String>,
    pub looking_for: Option<String>,
    pub distance: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

fn parse_field<T: FromStr>(field: &str, raw: Option<&str>, code: ErrorCode) -> AppResult<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_field(code, field, format!("{field} is malformed: {s:?}"))),
    }
}

impl FilterOverride {
    pub fn parse(raw: &RawFilter) -> AppResult<Self> {
        let latitude = parse_field::<f64>("latitude", raw.latitude.as_deref(), ErrorCode::InvalidCoordinates)?;
        let longitude = parse_field::<f64>("longitude", raw.longitude.as_deref(), ErrorCode::InvalidCoordinates)?;
        let location = Point::from_optional(latitude, longitude)?;

        Ok(Self {
            location,
            search_gender: parse_field::<SearchGender>("searchGender", raw.search_gender.as_deref(), ErrorCode::InvalidFilter)?,
            looking_for: raw.looking_for.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            age_from: parse_field("ageFrom", raw.age_from.as_deref(), ErrorCode::InvalidFilter)?,
            age_to: parse_field("ageTo", raw.age_to.as_deref(), ErrorCode::InvalidFilter)?,
            distance_km: parse_field("distance", raw.distance.as_deref(), ErrorCode::InvalidFilter)?,
            page: parse_field("page", raw.page.as_deref(), ErrorCode::InvalidPagination)?,
            size: parse_field("size", raw.size.as_deref(), ErrorCode::InvalidPagination)?,
        })
    }

    /// Range checks on the supplied fields alone, so obviously bad input is
    /// rejected before any storage access.
    pub fn validate(&self) -> AppResult<()> {
        let base = FilterValues {
            age_from: self.age_from.unwrap_or(MIN_AGE),
            age_to: self.age_to.unwrap_or(MAX_AGE),
            ..FilterValues::default()
        };
        merge_filter(base, &FilterOverride { location: None, ..self.clone() }).map(|_| ())
    }
}

/// Applies the override on top of `base` and validates the result.
pub fn merge_filter(base: FilterValues, ov: &FilterOverride) -> AppResult<FilterValues> {
    let merged = FilterValues {
        search_gender: ov.search_gender.map(|g| g.as_str().to_string()).unwrap_or(base.search_gender),
        looking_for: ov.looking_for.clone().unwrap_or(base.looking_for),
        age_from: ov.age_from.unwrap_or(base.age_from),
        age_to: ov.age_to.unwrap_or(base.age_to),
        distance_km: ov.distance_km.unwrap_or(base.distance_km),
        page: ov.page.unwrap_or(base.page),
        size: ov.size.unwrap_or(base.size),
    };
    validate_filter(&merged)?;
    Ok(merged)
}

pub fn validate_filter(f: &FilterValues) -> AppResult<()> {
    if f.search_gender.parse::<SearchGender>().is_err() {
        return Err(AppError::invalid_field(
            ErrorCode::InvalidFilter,
            "searchGender",
            "searchGender must be one of man, woman, all",
        ));
    }
    if !(MIN_AGE..=MAX_AGE).contains(&f.age_from) {
        return Err(AppError::invalid_field(
            ErrorCode::InvalidFilter,
            "ageFrom",
            format!("ageFrom must be between {MIN_AGE} and {MAX_AGE}"),
        ));
    }
    if !(MIN_AGE..=MAX_AGE).contains(&f.age_to) {
        return Err(AppError::invalid_field(
            ErrorCode::InvalidFilter,
            "ageTo",
            format!("ageTo must be between {MIN_AGE} and {MAX_AGE}"),
        ));
    }
    if f.age_from > f.age_to {
        return Err(AppError::invalid_field(
            ErrorCode::InvalidFilter,
            "ageFrom",
            "ageFrom must not exceed ageTo",
        ));
    }
    if !(1..=MAX_DISTANCE_KM).contains(&f.distance_km) {
        return Err(AppError::invalid_field(
            ErrorCode::InvalidFilter,
            "distance",
            format!("distance must be between 1 and {MAX_DISTANCE_KM} km"),
        ));
    }
    PageRequest::new(i64::from(f.page), i64::from(f.size))?;
    Ok(())
}

/// Birthdate range for an age range, by calendar year.
///
/// Someone aged `ageTo` this year may have been born as early as
/// Jan 1 of `year - ageTo - 1`; someone aged `ageFrom` as late as Dec 31 of
/// `year - ageFrom`. This deliberately over-includes by up to a year at each
/// end instead of comparing exact birthdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BirthdateWindow {
    pub fn for_ages(age_from: i32, age_to: i32, current_year: i32) -> AppResult<Self> {
        let invalid = || AppError::invalid_field(ErrorCode::InvalidFilter, "ageTo", "age range out of bounds");

        let start = NaiveDate::from_ymd_opt(current_year - age_to - 1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(current_year - age_from, 12, 31)
            .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
            .ok_or_else(invalid)?;

        Ok(Self { start, end })
    }

    pub fn contains(&self, birthday: NaiveDate) -> bool {
        birthday >= self.start.date() && birthday <= self.end.date()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub is_online: bool,
    pub last_online: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Meters; omitted when the candidate hides its distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

pub fn discover<S>(
    store: &S,
    viewer: &Profile,
    ov: &FilterOverride,
    now: DateTime<Utc>,
) -> AppResult<Page<CandidateSummary>>
where
    S: ProfileRepository + LocationRepository + ImageRepository + ?Sized,
{
    ensure_active(viewer)?;
    metrics::counter!("discovery_requests_total").increment(1);

    ov.validate()?;

    // The override wins and is persisted back, but only once the viewer's
    // location is known.
    let stored = store.find_filter(viewer.id)?;
    let base = stored.as_ref().map(FilterValues::from).unwrap_or_default();
    let filter = merge_filter(base.clone(), ov)?;

    let origin = match ov.location {
        Some(point) => {
            store.upsert_navigator(viewer.id, point, now)?;
            point
        }
        None => store
            .find_navigator(viewer.id)?
            .map(|n| Point::new(n.latitude, n.longitude))
            .ok_or_else(|| AppError::new(ErrorCode::LocationRequired, "no location recorded for this profile"))?,
    };

    if stored.is_none() || filter != base {
        store.upsert_filter(viewer.id, &filter, now)?;
    }

    let page = PageRequest::new(i64::from(filter.page), i64::from(filter.size))?;
    let radius_m = km_to_m(filter.distance_km);

    let gender = filter
        .search_gender
        .parse::<SearchGender>()
        .ok()
        .and_then(|g| g.gender())
        .map(|g| g.as_str().to_string());

    let rows = store.candidates(&CandidateQuery {
        viewer_id: viewer.id,
        gender,
        birthdays: BirthdateWindow::for_ages(filter.age_from, filter.age_to, now.year())?,
        bbox: BoundingBox::around(origin, radius_m),
    })?;

    let mut ranked: Vec<_> = rows
        .into_iter()
        .map(|row| (distance_m(origin, row.location), row))
        .filter(|(d, _)| *d <= radius_m)
        .collect();

    ranked.sort_by(|(da, a), (db, b)| {
        da.total_cmp(db)
            .then_with(|| b.last_online.cmp(&a.last_online))
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });

    let total = ranked.len() as u64;
    let slice: Vec<_> = ranked
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    let ids: Vec<Uuid> = slice.iter().map(|(_, row)| row.profile_id).collect();
    let mut images = store.first_public_images(&ids)?;

    let content = slice
        .into_iter()
        .map(|(d, row)| CandidateSummary {
            id: row.profile_id,
            is_online: models::is_online(row.last_online, now),
            last_online: row.last_online,
            image: images.remove(&row.profile_id),
            distance: row.is_show_distance.then_some(d),
        })
        .collect();

    tracing::debug!(
        profile_id = %viewer.id,
        total,
        page = page.page(),
        radius_km = filter.distance_km,
        "discovery page built"
    );

    Ok(Page::new(content, page, total))
}

/// Viewer-to-target distance for the detail view, in meters.
pub fn distance_between<S>(store: &S, viewer_id: Uuid, target: &Profile) -> AppResult<Option<f64>>
where
    S: LocationRepository + ?Sized,
{
    if !target.is_show_distance {
        return Ok(None);
    }
    let (Some(a), Some(b)) = (store.find_navigator(viewer_id)?, store.find_navigator(target.id)?) else {
        return Ok(None);
    };
    Ok(Some(distance_m(
        Point::new(a.latitude, a.longitude),
        Point::new(b.latitude, b.longitude),
    )))
}
