//! HTTP relay server: forwards request bodies as Pub/Sub messages

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use mqutil::{SHUTDOWN_GRACE, TopicPublisher};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::routes::create_router;
use crate::http::RelayError;

pub type AppState = Arc<AppStateInner>;

#[derive(Clone)]
pub struct AppStateInner {
    pub publisher: Arc<dyn TopicPublisher>,
}

pub fn create_app_state(publisher: Arc<dyn TopicPublisher>) -> AppState {
    Arc::new(AppStateInner { publisher })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: String,
    pub port: u16,
    /// Upper bound on connection draining once shutdown starts.
    pub grace: Duration,
}

impl RelayConfig {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            grace: SHUTDOWN_GRACE,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

pub async fn bind(config: &RelayConfig) -> Result<TcpListener, RelayError> {
    let bind_address = config.bind_address();
    TcpListener::bind(&bind_address)
        .await
        .map_err(|e| RelayError::Bind {
            address: bind_address,
            reason: e.to_string(),
        })
}

/// Serve the relay on `listener` until `cancel` fires.
///
/// Cancellation starts a graceful shutdown: the listener stops accepting,
/// idle keep-alive connections are closed, and in-flight requests may finish.
/// If draining takes longer than `grace` the server future is dropped, which
/// closes the listener; connections still open are torn down with the
/// runtime when the process exits. Both outcomes are a normal stop.
pub async fn serve(
    listener: TcpListener,
    publisher: Arc<dyn TopicPublisher>,
    cancel: CancellationToken,
    grace: Duration,
) -> Result<(), RelayError> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| RelayError::Serve {
            reason: e.to_string(),
        })?;
    let topic = publisher.topic().to_string();
    let app = create_router(create_app_state(publisher));

    let draining = cancel.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            draining.cancelled().await;
            info!("Relay shutting down, draining connections");
        })
        .into_future();
    let deadline = async {
        cancel.cancelled().await;
        tokio::time::sleep(grace).await;
    };

    info!("Running producer relay for topic '{topic}' at http://{local_addr}");
    tokio::select! {
        result = server => result.map_err(|e| RelayError::Serve { reason: e.to_string() })?,
        _ = deadline => warn!("Relay did not drain within {grace:?}, closing remaining connections"),
    }
    info!("Relay stopped");
    Ok(())
}

pub async fn start_relay(
    config: &RelayConfig,
    publisher: Arc<dyn TopicPublisher>,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    let listener = bind(config).await?;
    serve(listener, publisher, cancel, config.grace).await
}
