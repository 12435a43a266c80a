use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use amora_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::repository::ProfileRepository;
use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.store.ping() {
        Ok(()) => HealthCheck { name: "database".into(), status: HealthStatus::Healthy, message: None },
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            HealthCheck {
                name: "database".into(),
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
            }
        }
    };

    Json(HealthResponse::new("amora-profile", env!("CARGO_PKG_VERSION"), vec![database]))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
