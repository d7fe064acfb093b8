//! Session-scoped access to the Pub/Sub service.
//!
//! Every command body receives a [`Session`] from [`with_session`], which is
//! the only place a service connection is opened. The session is closed when
//! the body returns, whichever way it returns; on unwind the connection is
//! released when the session is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::PubSubError;
use crate::service::{GcloudService, MemoryBroker, PubSubService};

/// Environment variable the Pub/Sub client reads to target an emulator.
pub const EMULATOR_HOST_ENV: &str = "PUBSUB_EMULATOR_HOST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub project: String,
    /// `host:port` of a Pub/Sub emulator to use instead of production.
    pub emulator_host: Option<String>,
}

impl SessionConfig {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            emulator_host: None,
        }
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }
}

/// Export the configured emulator host for the client library.
///
/// # Safety
///
/// Mutates the process environment. Call it before the async runtime or any
/// other thread is started.
pub unsafe fn export_emulator_host(config: &SessionConfig) {
    if let Some(host) = &config.emulator_host {
        // SAFETY: the caller guarantees no other thread is running.
        unsafe { std::env::set_var(EMULATOR_HOST_ENV, host) };
    }
}

/// Opens service connections for a session.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &SessionConfig)
    -> Result<Arc<dyn PubSubService>, PubSubError>;
}

/// Connects to Google Cloud Pub/Sub, or to the emulator named in the config.
pub struct GcloudConnector;

#[async_trait]
impl Connector for GcloudConnector {
    async fn connect(
        &self,
        config: &SessionConfig,
    ) -> Result<Arc<dyn PubSubService>, PubSubError> {
        if let Some(host) = &config.emulator_host {
            let exported = std::env::var(EMULATOR_HOST_ENV).ok();
            if exported.as_deref() != Some(host.as_str()) {
                return Err(PubSubError::Connection {
                    reason: format!(
                        "emulator host {host} must be exported as {EMULATOR_HOST_ENV} before connecting"
                    ),
                });
            }
            info!(emulator_host = %host, "Using Pub/Sub emulator");
        }
        let service = GcloudService::connect(&config.project).await?;
        Ok(Arc::new(service))
    }
}

#[async_trait]
impl Connector for MemoryBroker {
    async fn connect(
        &self,
        config: &SessionConfig,
    ) -> Result<Arc<dyn PubSubService>, PubSubError> {
        Ok(Arc::new(MemoryBroker::connect(self, &config.project)))
    }
}

/// An open connection to the service, owned by one command invocation.
pub struct Session {
    service: Arc<dyn PubSubService>,
    closed: bool,
}

impl Session {
    async fn open(connector: &dyn Connector, config: &SessionConfig) -> Result<Self, PubSubError> {
        let service = connector.connect(config).await?;
        debug!(project_id = %config.project, "Opened Pub/Sub session");
        Ok(Self {
            service,
            closed: false,
        })
    }

    pub fn service(&self) -> &dyn PubSubService {
        self.service.as_ref()
    }

    /// A shared handle for tasks that run within the session's scope.
    pub fn shared(&self) -> Arc<dyn PubSubService> {
        self.service.clone()
    }

    async fn close(mut self) -> Result<(), PubSubError> {
        self.closed = true;
        let result = self.service.close().await;
        debug!(project_id = %self.service.project(), "Closed Pub/Sub session");
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                project_id = %self.service.project(),
                "Pub/Sub session dropped without being closed"
            );
        }
    }
}

/// Open a session, run `body` with it, and close it on every exit path.
///
/// A close failure is reported as the result only when the body succeeded;
/// otherwise the body's error wins and the close failure is logged.
pub async fn with_session<T, E, F>(
    connector: &dyn Connector,
    config: &SessionConfig,
    body: F,
) -> Result<T, E>
where
    F: AsyncFnOnce(&Session) -> Result<T, E>,
    E: From<PubSubError>,
{
    let session = Session::open(connector, config).await?;
    let outcome = body(&session).await;
    let closed = session.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_error)) => Err(close_error.into()),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            warn!(error = %close_error, "Failed to close Pub/Sub session");
            Err(error)
        }
    }
}
