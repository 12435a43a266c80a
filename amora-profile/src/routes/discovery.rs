use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::pagination::Page;
use amora_shared::types::ApiResponse;

use crate::routes::caller;
use crate::services::discovery::{self, CandidateSummary, FilterOverride, RawFilter};
use crate::AppState;

/// GET /discover - candidates near the caller, nearest first.
pub async fn discover(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawFilter>,
) -> AppResult<Json<ApiResponse<Page<CandidateSummary>>>> {
    let overrides = FilterOverride::parse(&raw)?;
    let viewer = caller(&state, &user)?;

    let page = discovery::discover(&state.store, &viewer, &overrides, Utc::now())?;
    Ok(Json(ApiResponse::ok(page)))
}
