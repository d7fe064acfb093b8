use std::sync::Arc;

use mqutil::{Delivery, DeliveryHandler, Disposition, PubSubService};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::Output;

/// Handler that prints each delivery and acks it once printed.
///
/// A delivery that could not be written is nacked so the service redelivers
/// it instead of it being lost.
pub fn print_handler(out: Output) -> DeliveryHandler {
    Arc::new(move |delivery: &Delivery| match out.delivery(delivery) {
        Ok(()) => Disposition::Ack,
        Err(e) => {
            warn!(message_id = %delivery.id, error = %e, "Failed to print message, nacking");
            Disposition::Nack
        }
    })
}

pub async fn subscribe(
    service: &dyn PubSubService,
    subscription: &str,
    out: Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    info!(subscription, "Listening for messages, press Ctrl+C to stop");
    service
        .receive(subscription, print_handler(out), cancel)
        .await?;
    info!(subscription, "Stopped listening");
    Ok(())
}
