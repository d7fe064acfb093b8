//! `topics list|create|delete`

use mqutil::PubSubService;
use tracing::debug;

use super::subscriptions::create_one;
use crate::error::CliError;
use crate::output::Output;
use crate::resolve::TopicSpec;

pub async fn list(service: &dyn PubSubService, out: &Output) -> Result<(), CliError> {
    for topic in service.list_topics().await? {
        out.line(format_args!("{topic}"))?;
    }
    Ok(())
}

/// Create each topic and then the subscriptions listed for it.
///
/// Resources that already exist are reported and skipped. Any other failure
/// stops the batch.
pub async fn create(
    service: &dyn PubSubService,
    specs: &[TopicSpec],
    out: &Output,
) -> Result<(), CliError> {
    for spec in specs {
        match service.create_topic(&spec.topic).await {
            Ok(name) => out.line(format_args!("created topic {name}"))?,
            Err(e) if e.is_already_exists() => {
                out.line(format_args!("topic already exists: {}", spec.topic))?
            }
            Err(e) => return Err(e.into()),
        }
        for subscription in &spec.subscriptions {
            create_one(service, &spec.topic, subscription, out).await?;
        }
    }
    Ok(())
}

/// Delete each topic after deleting every subscription attached to it.
///
/// The first failure stops the command; a topic whose subscriptions could not
/// all be deleted is left in place.
pub async fn delete(
    service: &dyn PubSubService,
    topics: &[String],
    out: &Output,
) -> Result<(), CliError> {
    for topic in topics {
        let attached = service.list_subscriptions(topic).await?;
        debug!(topic = %topic, count = attached.len(), "Deleting attached subscriptions");
        for subscription in attached {
            service.delete_subscription(&subscription).await?;
            out.line(format_args!("deleted subscription: {subscription}"))?;
        }
        service.delete_topic(topic).await?;
        out.line(format_args!("deleted topic: {topic}"))?;
    }
    Ok(())
}
