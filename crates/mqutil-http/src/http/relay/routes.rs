use super::{
    metadata::health_check,
    producer::{method_not_allowed, publish_data},
    server::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/data", post(publish_data).fallback(method_not_allowed))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
