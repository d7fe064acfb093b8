//! Metadata route handlers for the relay

use super::server::AppState;
use crate::http::HealthCheckResponse;
use axum::{extract::State, response::Json};
use log::trace;

pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthCheckResponse> {
    trace!("GET /health");
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: "mqutil-relay".to_string(),
        topic: app_state.publisher.topic().to_string(),
    })
}
