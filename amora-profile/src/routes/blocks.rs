use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::routes::caller;
use crate::services::trust;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub blocked_profile_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub blocked_profile_id: Uuid,
    pub mutual: bool,
}

pub async fn block_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BlockRequest>,
) -> AppResult<Json<ApiResponse<BlockResponse>>> {
    let blocker = caller(&state, &user)?;

    trust::block(&state.store, &blocker, req.blocked_profile_id, Utc::now())?;

    publisher::publish_block_created(&state.rabbitmq, blocker.id, req.blocked_profile_id, true).await;

    Ok(Json(ApiResponse::ok(BlockResponse {
        blocked_profile_id: req.blocked_profile_id,
        mutual: true,
    })))
}
