use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::AppResult;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::routes::{caller, validated};
use crate::services::trust;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRequest {
    pub accused_profile_id: Uuid,
    #[validate(length(min = 1, max = 1000, message = "reason must be 1 to 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub complaint_id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub async fn file_complaint(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ComplaintRequest>,
) -> AppResult<Json<ApiResponse<ComplaintResponse>>> {
    validated(&req)?;
    let complaining = caller(&state, &user)?;

    let outcome = trust::file_complaint(&state.store, &complaining, req.accused_profile_id, req.reason, Utc::now())?;
    let complaint = outcome.complaint;

    publisher::publish_complaint_filed(
        &state.rabbitmq,
        complaint.id,
        complaining.id,
        complaint.accused_profile_id,
        complaint.created_at,
    )
    .await;

    if outcome.accused_suspended {
        publisher::publish_profile_suspended(
            &state.rabbitmq,
            complaint.accused_profile_id,
            outcome.complaints_this_month,
        )
        .await;
    }

    Ok(Json(ApiResponse::ok(ComplaintResponse {
        complaint_id: complaint.id,
        created_at: complaint.created_at,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_shared::errors::ErrorCode;
    use serde_json::json;

    #[test]
    fn empty_reason_is_rejected() {
        let req: ComplaintRequest =
            serde_json::from_value(json!({"accusedProfileId": Uuid::now_v7(), "reason": ""})).unwrap();
        assert_eq!(validated(&req).unwrap_err().code(), ErrorCode::ValidationError);
    }

    #[test]
    fn response_uses_camel_case() {
        let json = serde_json::to_value(ComplaintResponse { complaint_id: Uuid::nil(), created_at: Utc::now() }).unwrap();
        assert!(json.get("complaintId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
