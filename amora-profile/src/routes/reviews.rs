use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::pagination::{Page, PaginationParams};
use amora_shared::types::ApiResponse;

use crate::models::{Review, UpdateReview};
use crate::routes::{caller, validated};
use crate::services::reviews;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub rating: f32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
    pub rating: Option<f32>,
}

pub async fn create_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    validated(&req)?;
    let author = caller(&state, &user)?;
    let review = reviews::create_review(&state.store, &author, req.message, req.rating, Utc::now())?;
    Ok(Json(ApiResponse::ok(review)))
}

pub async fn list_reviews(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Page<Review>>>> {
    let page = params.validate()?;
    caller(&state, &user)?;
    Ok(Json(ApiResponse::ok(reviews::list_reviews(&state.store, page)?)))
}

pub async fn get_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Review>>> {
    caller(&state, &user)?;
    Ok(Json(ApiResponse::ok(reviews::get_review(&state.store, id)?)))
}

pub async fn update_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    validated(&req)?;
    let author = caller(&state, &user)?;

    let changes = UpdateReview { message: req.message, rating: req.rating };
    let review = reviews::edit_review(&state.store, &author, id, changes, Utc::now())?;
    Ok(Json(ApiResponse::ok(review)))
}

pub async fn delete_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let author = caller(&state, &user)?;
    reviews::delete_review(&state.store, &author, id, Utc::now())?;
    Ok(Json(ApiResponse::ok(())))
}
