//! `subs --topic <topic> list|create|delete`

use std::collections::BTreeSet;

use mqutil::PubSubService;
use mqutil::service::resource_id;
use tracing::warn;

use crate::error::CliError;
use crate::output::Output;

pub async fn list(service: &dyn PubSubService, topic: &str, out: &Output) -> Result<(), CliError> {
    for subscription in service.list_subscriptions(topic).await? {
        out.line(format_args!("{subscription}"))?;
    }
    Ok(())
}

pub async fn create(
    service: &dyn PubSubService,
    topic: &str,
    subscriptions: &[String],
    out: &Output,
) -> Result<(), CliError> {
    for subscription in subscriptions {
        create_one(service, topic, subscription, out).await?;
    }
    Ok(())
}

/// Create one subscription on `topic`, tolerating an existing one.
pub(crate) async fn create_one(
    service: &dyn PubSubService,
    topic: &str,
    subscription: &str,
    out: &Output,
) -> Result<(), CliError> {
    match service.create_subscription(subscription, topic).await {
        Ok(name) => out.line(format_args!("created subscription: {name}")),
        Err(e) if e.is_already_exists() => {
            out.line(format_args!("subscription already exists: {subscription}"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the named subscriptions of `topic`, stopping at the first failure.
///
/// Only subscriptions currently attached to the topic are touched.
pub async fn delete(
    service: &dyn PubSubService,
    topic: &str,
    subscriptions: &[String],
    out: &Output,
) -> Result<(), CliError> {
    let mut requested: BTreeSet<&str> = subscriptions.iter().map(String::as_str).collect();
    for name in service.list_subscriptions(topic).await? {
        if !requested.remove(resource_id(&name)) {
            continue;
        }
        service.delete_subscription(&name).await?;
        out.line(format_args!("deleted subscription: {name}"))?;
    }
    for missing in requested {
        warn!(subscription = missing, topic, "Subscription is not attached to topic");
    }
    Ok(())
}
