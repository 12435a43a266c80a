use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::{AppError, AppResult};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Gender, Profile, SearchGender, UpdateProfile};
use crate::repository::{FilterValues, ProfileRepository};
use crate::routes::{caller, validated};
use crate::services::discovery::{merge_filter, FilterOverride};
use crate::services::distance::Point;
use crate::services::profile_service::{self, CreateProfile, OwnProfile, ProfileDetail};
use crate::AppState;

// --- POST /profiles ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 64, message = "display name must be 1 to 64 characters"))]
    pub display_name: String,
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub search_gender: SearchGender,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub looking_for: String,
    #[validate(range(min = 100, max = 250))]
    pub height: Option<i32>,
    #[validate(range(min = 30, max = 300))]
    pub weight: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub location: String,
    pub telegram_id: Option<i64>,
    #[serde(default = "default_show_distance")]
    pub is_show_distance: bool,
    pub age_from: Option<i32>,
    pub age_to: Option<i32>,
    pub distance: Option<i32>,
    pub page: Option<i32>,
    pub size: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_show_distance() -> bool { true }

impl CreateProfileRequest {
    fn into_input(self, credential_id: Uuid) -> AppResult<CreateProfile> {
        let filter = merge_filter(
            FilterValues::default(),
            &FilterOverride {
                search_gender: Some(self.search_gender),
                looking_for: Some(self.looking_for.clone()).filter(|s| !s.is_empty()),
                age_from: self.age_from,
                age_to: self.age_to,
                distance_km: self.distance,
                page: self.page,
                size: self.size,
                ..Default::default()
            },
        )?;

        Ok(CreateProfile {
            credential_id,
            telegram_id: self.telegram_id,
            display_name: self.display_name.trim().to_string(),
            birthday: self.birthday,
            gender: self.gender,
            search_gender: self.search_gender,
            looking_for: self.looking_for,
            height: self.height,
            weight: self.weight,
            description: self.description,
            location: self.location,
            is_show_distance: self.is_show_distance,
            filter,
            coordinates: Point::from_optional(self.latitude, self.longitude)?,
        })
    }
}

pub async fn create_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    validated(&req)?;
    let input = req.into_input(user.id)?;

    let profile = profile_service::create_profile(&state.store, input, Utc::now())?;

    publisher::publish_profile_created(&state.rabbitmq, profile.id, profile.credential_id).await;

    Ok(Json(ApiResponse::ok(profile)))
}

// --- GET /me ---

pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<OwnProfile>>> {
    let profile = caller(&state, &user)?;
    Ok(Json(ApiResponse::ok(profile_service::own_profile(&state.store, profile)?)))
}

// --- PATCH /me ---

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub telegram_id: Option<i64>,
    #[validate(length(min = 1, max = 64, message = "display name must be 1 to 64 characters"))]
    pub display_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub search_gender: Option<SearchGender>,
    #[validate(length(max = 32))]
    pub looking_for: Option<String>,
    #[validate(range(min = 100, max = 250))]
    pub height: Option<i32>,
    #[validate(range(min = 30, max = 300))]
    pub weight: Option<i32>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 128))]
    pub location: Option<String>,
    pub is_show_distance: Option<bool>,
    pub is_invisible: Option<bool>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            telegram_id: req.telegram_id,
            display_name: req.display_name.map(|s| s.trim().to_string()),
            birthday: req.birthday,
            gender: req.gender.map(|g| g.as_str().to_string()),
            search_gender: req.search_gender.map(|g| g.as_str().to_string()),
            looking_for: req.looking_for,
            height: req.height,
            weight: req.weight,
            description: req.description,
            location: req.location,
            is_show_distance: req.is_show_distance,
            is_invisible: req.is_invisible,
        }
    }
}

pub async fn update_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    validated(&req)?;
    let profile = caller(&state, &user)?;

    let updated = profile_service::update_profile(&state.store, &profile, req.into(), Utc::now())?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /me ---

pub async fn delete_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<()>>> {
    let profile = caller(&state, &user)?;

    profile_service::delete_profile(&state.store, &profile, Utc::now())?;

    publisher::publish_profile_deleted(&state.rabbitmq, profile.id).await;

    Ok(Json(ApiResponse::ok(())))
}

// --- GET /profiles/:id ---

#[derive(Debug, Default, Deserialize)]
pub struct ViewerLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(location): Query<ViewerLocation>,
) -> AppResult<Json<ApiResponse<ProfileDetail>>> {
    let viewer = caller(&state, &user)?;
    let point = Point::from_optional(location.latitude, location.longitude)?;

    let target = state
        .store
        .find_profile(id)?
        .ok_or_else(AppError::profile_not_found)?;

    let detail = profile_service::profile_detail(&state.store, &viewer, target, point, Utc::now())?;
    Ok(Json(ApiResponse::ok(detail)))
}

// --- GET /profiles/telegram/:telegram_id ---

pub async fn get_profile_by_telegram(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> AppResult<Json<ApiResponse<ProfileDetail>>> {
    let viewer = caller(&state, &user)?;

    let target = state
        .store
        .find_profile_by_telegram(telegram_id)?
        .ok_or_else(AppError::profile_not_found)?;

    let detail = profile_service::profile_detail(&state.store, &viewer, target, None, Utc::now())?;
    Ok(Json(ApiResponse::ok(detail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_shared::errors::ErrorCode;
    use serde_json::json;

    fn request(extra: serde_json::Value) -> CreateProfileRequest {
        let mut body = json!({
            "displayName": "  Rui ",
            "birthday": "1994-07-01",
            "gender": "man",
            "searchGender": "woman",
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn create_request_fills_filter_defaults() {
        let input = request(json!({})).into_input(Uuid::now_v7()).unwrap();

        assert_eq!(input.display_name, "Rui");
        assert!(input.is_show_distance);
        assert_eq!(input.filter.search_gender, "woman");
        assert_eq!(input.filter.age_from, FilterValues::default().age_from);
        assert_eq!(input.coordinates, None);
    }

    #[test]
    fn create_request_validates_filter_and_coordinates() {
        let err = request(json!({"ageFrom": 50, "ageTo": 20})).into_input(Uuid::now_v7()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFilter);

        let err = request(json!({"latitude": 10.0})).into_input(Uuid::now_v7()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCoordinates);

        let input = request(json!({"latitude": 10.0, "longitude": 20.0, "distance": 5}))
            .into_input(Uuid::now_v7())
            .unwrap();
        assert_eq!(input.coordinates, Some(Point::new(10.0, 20.0)));
        assert_eq!(input.filter.distance_km, 5);
    }

    #[test]
    fn unknown_gender_is_rejected_at_deserialization() {
        let body = json!({
            "displayName": "x",
            "birthday": "1994-07-01",
            "gender": "robot",
            "searchGender": "all",
        });
        assert!(serde_json::from_value::<CreateProfileRequest>(body).is_err());
    }

    #[test]
    fn update_request_maps_enums_to_stored_strings() {
        let req: UpdateProfileRequest =
            serde_json::from_value(json!({"gender": "woman", "searchGender": "all", "height": 170})).unwrap();
        assert!(validated(&req).is_ok());

        let changes = UpdateProfile::from(req);
        assert_eq!(changes.gender.as_deref(), Some("woman"));
        assert_eq!(changes.search_gender.as_deref(), Some("all"));
        assert_eq!(changes.display_name, None);
    }

    #[test]
    fn out_of_range_height_fails_validation() {
        let req = UpdateProfileRequest { height: Some(20), ..Default::default() };
        assert_eq!(validated(&req).unwrap_err().code(), ErrorCode::ValidationError);
    }
}
