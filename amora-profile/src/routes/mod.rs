pub mod blocks;
pub mod complaints;
pub mod discovery;
pub mod health;
pub mod images;
pub mod likes;
pub mod navigator;
pub mod profile;
pub mod reviews;

use chrono::Utc;
use validator::Validate;

use amora_shared::errors::{AppError, AppResult};
use amora_shared::types::auth::AuthUser;

use crate::models::Profile;
use crate::services::profile_service;
use crate::AppState;

/// Resolves the authenticated caller to a profile and refreshes its `last_online`.
pub(crate) fn caller(state: &AppState, user: &AuthUser) -> AppResult<Profile> {
    profile_service::resolve_caller(&state.store, user.id, Utc::now())
}

pub(crate) fn validated<T: Validate>(req: &T) -> AppResult<()> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))
}
