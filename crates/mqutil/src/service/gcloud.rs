//! Google Cloud Pub/Sub backend.
//!
//! # Authentication
//!
//! Uses ADC (Application Default Credentials):
//! - Set `GOOGLE_APPLICATION_CREDENTIALS` to a service account JSON path
//! - For local testing: set `PUBSUB_EMULATOR_HOST` to the emulator address
//!
//! The client library resolves the emulator endpoint from the environment when
//! its config is built, so `PUBSUB_EMULATOR_HOST` must already be exported by
//! the time [`GcloudService::connect`] runs.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use google_cloud_googleapis::pubsub::v1::PubsubMessage;
use google_cloud_pubsub::client::{Client, ClientConfig};
use google_cloud_pubsub::publisher::Publisher;
use google_cloud_pubsub::subscriber::ReceivedMessage;
use google_cloud_pubsub::subscription::SubscriptionConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::r#trait::dispatch;
use super::{Delivery, DeliveryHandler, Disposition, PubSubService, TopicPublisher};
use crate::error::PubSubError;

macro_rules! grpc_error {
    ($status:expr, $operation:expr, $resource:expr) => {
        PubSubError::from_grpc(
            $status.code() as i32,
            $status.message(),
            $operation,
            $resource,
        )
    };
}

pub struct GcloudService {
    project: String,
    client: Client,
}

impl GcloudService {
    pub async fn connect(project: &str) -> Result<Self, PubSubError> {
        let mut client_config =
            ClientConfig::default()
                .with_auth()
                .await
                .map_err(|e| PubSubError::Connection {
                    reason: format!("failed to configure auth: {e}"),
                })?;
        client_config.project_id = Some(project.to_string());

        let client = Client::new(client_config)
            .await
            .map_err(|e| PubSubError::Connection {
                reason: format!("failed to create client: {e}"),
            })?;

        info!(project_id = %project, "Connected to Google Pub/Sub");
        Ok(Self {
            project: project.to_string(),
            client,
        })
    }
}

struct GcloudPublisher {
    topic: String,
    publisher: Publisher,
}

#[async_trait]
impl TopicPublisher for GcloudPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, data: Vec<u8>) -> Result<String, PubSubError> {
        let message = PubsubMessage {
            data: data.into(),
            ..Default::default()
        };
        let awaiter = self.publisher.publish(message).await;
        awaiter
            .get()
            .await
            .map_err(|status| grpc_error!(status, "publish to", &self.topic))
    }

    async fn flush(&self) {
        // Shutting down a clone closes the shared queue and waits for its workers.
        let mut publisher = self.publisher.clone();
        publisher.shutdown().await;
        debug!(topic = %self.topic, "Flushed publisher");
    }
}

#[async_trait]
impl PubSubService for GcloudService {
    fn project(&self) -> &str {
        &self.project
    }

    fn publisher(&self, topic: &str) -> Arc<dyn TopicPublisher> {
        Arc::new(GcloudPublisher {
            topic: topic.to_string(),
            publisher: self.client.topic(topic).new_publisher(None),
        })
    }

    async fn list_topics(&self) -> Result<Vec<String>, PubSubError> {
        self.client
            .get_topics(None)
            .await
            .map_err(|status| grpc_error!(status, "list topics of", &self.project))
    }

    async fn create_topic(&self, topic: &str) -> Result<String, PubSubError> {
        let created = self
            .client
            .create_topic(topic, None, None)
            .await
            .map_err(|status| grpc_error!(status, "create topic", topic))?;
        Ok(created.fully_qualified_name().to_string())
    }

    async fn delete_topic(&self, topic: &str) -> Result<(), PubSubError> {
        self.client
            .topic(topic)
            .delete(None)
            .await
            .map_err(|status| grpc_error!(status, "delete topic", topic))
    }

    async fn list_subscriptions(&self, topic: &str) -> Result<Vec<String>, PubSubError> {
        let subscriptions = self
            .client
            .topic(topic)
            .subscriptions(None)
            .await
            .map_err(|status| grpc_error!(status, "list subscriptions of", topic))?;
        Ok(subscriptions
            .iter()
            .map(|s| s.fully_qualified_name().to_string())
            .collect())
    }

    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
    ) -> Result<String, PubSubError> {
        let created = self
            .client
            .create_subscription(subscription, topic, SubscriptionConfig::default(), None)
            .await
            .map_err(|status| grpc_error!(status, "create subscription", subscription))?;
        Ok(created.fully_qualified_name().to_string())
    }

    async fn delete_subscription(&self, subscription: &str) -> Result<(), PubSubError> {
        self.client
            .subscription(subscription)
            .delete(None)
            .await
            .map_err(|status| grpc_error!(status, "delete subscription", subscription))
    }

    async fn receive(
        &self,
        subscription: &str,
        handler: DeliveryHandler,
        cancel: CancellationToken,
    ) -> Result<(), PubSubError> {
        let mut stream = self
            .client
            .subscription(subscription)
            .subscribe(None)
            .await
            .map_err(|status| grpc_error!(status, "receive from", subscription))?;

        let closed = pump(&mut stream, &handler, &cancel).await;

        // Nacks whatever was buffered but not handed out, so it is redelivered.
        let unprocessed = stream.dispose().await;
        debug!(subscription = %subscription, unprocessed, "Stopped message stream");

        if closed {
            return Err(PubSubError::Remote {
                operation: "receive from".to_string(),
                resource: subscription.to_string(),
                message: "message stream closed".to_string(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PubSubError> {
        // The gRPC channels are released when the client is dropped with the session.
        debug!(project_id = %self.project, "Closing Pub/Sub client");
        Ok(())
    }
}

/// A pulled message that is settled with the service once handled.
#[async_trait]
trait Pulled: Send + Sync {
    fn delivery(&self) -> Delivery;

    async fn ack(&self) -> Result<(), PubSubError>;

    async fn nack(&self) -> Result<(), PubSubError>;
}

#[async_trait]
impl Pulled for ReceivedMessage {
    fn delivery(&self) -> Delivery {
        Delivery {
            id: self.message.message_id.clone(),
            data: self.message.data.to_vec(),
        }
    }

    async fn ack(&self) -> Result<(), PubSubError> {
        ReceivedMessage::ack(self)
            .await
            .map_err(|status| grpc_error!(status, "ack", &self.message.message_id))
    }

    async fn nack(&self) -> Result<(), PubSubError> {
        ReceivedMessage::nack(self)
            .await
            .map_err(|status| grpc_error!(status, "nack", &self.message.message_id))
    }
}

/// Hand each message to `handler` and settle it, until `cancel` fires or the
/// stream ends. Returns true when the stream ended first.
async fn pump<S>(stream: &mut S, handler: &DeliveryHandler, cancel: &CancellationToken) -> bool
where
    S: Stream + Unpin,
    S::Item: Pulled,
{
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            next = stream.next() => match next {
                Some(message) => message,
                None => return !cancel.is_cancelled(),
            },
        };

        let delivery = Arc::new(message.delivery());
        let settled = match dispatch(handler, delivery.clone()).await {
            Disposition::Ack => message.ack().await,
            Disposition::Nack => message.nack().await,
        };
        if let Err(error) = settled {
            warn!(message_id = %delivery.id, error = %error, "Failed to settle message");
        }
    }
}
