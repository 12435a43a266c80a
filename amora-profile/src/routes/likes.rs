use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::Like;
use crate::routes::caller;
use crate::services::trust;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLikeRequest {
    pub liked_profile_id: Uuid,
}

pub async fn send_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendLikeRequest>,
) -> AppResult<Json<ApiResponse<Like>>> {
    let liker = caller(&state, &user)?;

    let like = trust::like(&state.store, &liker, req.liked_profile_id, Utc::now())?;

    publisher::publish_like_sent(&state.rabbitmq, like.id, liker.id, like.liked_profile_id).await;

    Ok(Json(ApiResponse::ok(like)))
}

/// DELETE /likes/:id - withdraw a like; the edge stays with `isLiked = false`.
pub async fn remove_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Like>>> {
    let profile = caller(&state, &user)?;
    let like = trust::unlike(&state.store, &profile, id, Utc::now())?;
    Ok(Json(ApiResponse::ok(like)))
}

/// GET /likes/status/:target_id - the caller's like edge towards the target, if any.
pub async fn like_status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Option<Like>>>> {
    let profile = caller(&state, &user)?;
    let like = trust::like_status_for(&state.store, profile.id, target_id)?;
    Ok(Json(ApiResponse::ok(like)))
}
