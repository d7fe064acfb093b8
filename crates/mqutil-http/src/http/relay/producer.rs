//! Producer route handlers for the relay

use super::server::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Method, StatusCode},
};
use http_body_util::LengthLimitError;
use log::{error, info, trace, warn};

/// Largest request body accepted as a single message.
pub const MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

#[tracing::instrument(level = "debug", skip(app_state, body), fields(topic = %app_state.publisher.topic()))]
pub async fn publish_data(
    State(app_state): State<AppState>,
    body: Body,
) -> Result<StatusCode, (StatusCode, &'static str)> {
    let data = match axum::body::to_bytes(body, MAX_MESSAGE_BYTES).await {
        Ok(data) => data,
        Err(error) => {
            let error = error.into_inner();
            if error.is::<LengthLimitError>() {
                warn!("POST /data rejected: body exceeds {MAX_MESSAGE_BYTES} bytes");
                return Err((StatusCode::PAYLOAD_TOO_LARGE, "message too large"));
            }
            error!("POST /data error reading body: {error}");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "error reading body"));
        }
    };
    match app_state.publisher.publish(data.to_vec()).await {
        Ok(id) => {
            info!("POST /data - sent message {id}");
            Ok(StatusCode::CREATED)
        }
        Err(error) => {
            error!("POST /data error sending message: {error}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "error sending message"))
        }
    }
}

pub async fn method_not_allowed(method: Method) -> (StatusCode, &'static str) {
    trace!("{method} /data rejected");
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}
