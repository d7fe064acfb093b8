use crate::error::PubSubError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A message handed to a [`DeliveryHandler`] by a receive loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub id: String,
    pub data: Vec<u8>,
}

/// What the receive loop should do with a delivery once the handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Ask the service to redeliver the message.
    Nack,
}

/// Called once per delivery. Receive loops run it on the blocking pool, so it
/// may do blocking I/O such as writing to stdout.
pub type DeliveryHandler = Arc<dyn Fn(&Delivery) -> Disposition + Send + Sync>;

/// Run `handler` for `delivery` off the async workers.
pub(crate) async fn dispatch(handler: &DeliveryHandler, delivery: Arc<Delivery>) -> Disposition {
    let handler = handler.clone();
    match tokio::task::spawn_blocking(move || handler(&*delivery)).await {
        Ok(disposition) => disposition,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        // The runtime is shutting down; the message is left for redelivery.
        Err(_) => Disposition::Nack,
    }
}

/// Publishes messages to a single topic.
///
/// Implementations are shared across concurrent relay requests, so they must
/// be safe to call from many tasks at once.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    fn topic(&self) -> &str;

    /// Publish one message and wait for the service to assign its id.
    async fn publish(&self, data: Vec<u8>) -> Result<String, PubSubError>;

    /// Drain buffered publishes. Further publishes after a flush are an error
    /// for backends that batch.
    async fn flush(&self);
}

/// The remote operations every command body is built from.
///
/// Listing and creation return fully qualified resource names
/// (`projects/<project>/topics/<id>`); inputs are short ids unless noted.
#[async_trait]
pub trait PubSubService: Send + Sync {
    fn project(&self) -> &str;

    fn publisher(&self, topic: &str) -> Arc<dyn TopicPublisher>;

    async fn list_topics(&self) -> Result<Vec<String>, PubSubError>;

    async fn create_topic(&self, topic: &str) -> Result<String, PubSubError>;

    async fn delete_topic(&self, topic: &str) -> Result<(), PubSubError>;

    async fn list_subscriptions(&self, topic: &str) -> Result<Vec<String>, PubSubError>;

    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
    ) -> Result<String, PubSubError>;

    /// Accepts a short id or a fully qualified name; the latter may belong to
    /// another project.
    async fn delete_subscription(&self, subscription: &str) -> Result<(), PubSubError>;

    /// Pull from `subscription` until `cancel` fires or the stream fails.
    ///
    /// Returns once every in-flight handler invocation has completed.
    async fn receive(
        &self,
        subscription: &str,
        handler: DeliveryHandler,
        cancel: CancellationToken,
    ) -> Result<(), PubSubError>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<(), PubSubError>;
}

/// Short id of a fully qualified resource name.
pub fn resource_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
