use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{FilterPreference, Navigator, SearchGender};
use crate::repository::FilterValues;
use crate::routes::{caller, validated};
use crate::services::distance::Point;
use crate::services::location;
use crate::AppState;

// --- PUT /me/navigator ---

#[derive(Debug, Deserialize)]
pub struct NavigatorRequest {
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn put_navigator(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigatorRequest>,
) -> AppResult<Json<ApiResponse<Navigator>>> {
    let point = Point::checked(req.latitude, req.longitude)?;
    let profile = caller(&state, &user)?;

    let navigator = location::set_location(&state.store, &profile, point, Utc::now())?;
    Ok(Json(ApiResponse::ok(navigator)))
}

// --- GET /me/filter ---

pub async fn get_filter(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<FilterPreference>>> {
    let profile = caller(&state, &user)?;
    Ok(Json(ApiResponse::ok(location::saved_filter(&state.store, &profile)?)))
}

// --- PUT /me/filter ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub search_gender: SearchGender,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub looking_for: String,
    pub age_from: i32,
    pub age_to: i32,
    pub distance: i32,
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(default = "default_size")]
    pub size: i32,
}

fn default_page() -> i32 { 1 }
fn default_size() -> i32 { FilterValues::default().size }

impl From<FilterRequest> for FilterValues {
    fn from(req: FilterRequest) -> Self {
        Self {
            search_gender: req.search_gender.as_str().to_string(),
            looking_for: req.looking_for,
            age_from: req.age_from,
            age_to: req.age_to,
            distance_km: req.distance,
            page: req.page,
            size: req.size,
        }
    }
}

pub async fn put_filter(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> AppResult<Json<ApiResponse<FilterPreference>>> {
    validated(&req)?;
    let profile = caller(&state, &user)?;

    let filter = location::replace_filter(&state.store, &profile, req.into(), Utc::now())?;
    Ok(Json(ApiResponse::ok(filter)))
}
