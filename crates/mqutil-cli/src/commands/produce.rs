//! `produce one` and `produce svr`

use std::path::Path;

use mqutil::PubSubService;
use mqutil_http::{RelayConfig, start_relay};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::CliError;
use crate::output::Output;

/// Read a whole message from `file`, or from stdin when no file is given.
pub async fn read_source(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => tokio::fs::read(path)
            .await
            .map_err(|e| CliError::io(format!("read {}", path.display()), e)),
        None => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .map_err(|e| CliError::io("read stdin", e))?;
            Ok(data)
        }
    }
}

/// Publish one message and print the id the service assigned to it.
pub async fn publish_one(
    service: &dyn PubSubService,
    topic: &str,
    file: Option<&Path>,
    out: &Output,
) -> Result<(), CliError> {
    let publisher = service.publisher(topic);
    let result = match read_source(file).await {
        Ok(data) => publisher.publish(data).await.map_err(CliError::from),
        Err(e) => Err(e),
    };
    publisher.flush().await;

    let id = result.inspect_err(|e| error!(topic, error = %e, "Error publishing message"))?;
    out.line(format_args!("published message: {id}"))
}

/// Relay POST bodies to `topic` until `cancel` fires.
pub async fn publish_relay(
    service: &dyn PubSubService,
    topic: &str,
    relay: &RelayConfig,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let publisher = service.publisher(topic);
    let result = start_relay(relay, publisher.clone(), cancel).await;
    publisher.flush().await;
    info!(topic, "Publisher flushed");
    result.map_err(CliError::from)
}
