//! In-process Pub/Sub backend.
//!
//! Mirrors the resource model of the hosted service closely enough to drive
//! every command body without a network: topics fan out to their attached
//! subscriptions, subscriptions queue deliveries until acknowledged, and
//! listing returns fully qualified names. Connection and close counts are
//! tracked so callers can check the session lifecycle.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::r#trait::dispatch;
use super::{
    Delivery, DeliveryHandler, Disposition, PubSubService, TopicPublisher, resource_id,
    subscription_name, topic_name,
};
use crate::error::PubSubError;

/// Remote operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Publish,
    CreateTopic,
    DeleteTopic,
    ListSubscriptions,
    CreateSubscription,
    DeleteSubscription,
    Receive,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Publish => "publish to",
            Operation::CreateTopic => "create topic",
            Operation::DeleteTopic => "delete topic",
            Operation::ListSubscriptions => "list subscriptions of",
            Operation::CreateSubscription => "create subscription",
            Operation::DeleteSubscription => "delete subscription",
            Operation::Receive => "receive from",
        };
        f.write_str(name)
    }
}

struct SubscriptionState {
    topic: String,
    queue: VecDeque<Delivery>,
    notify: Arc<Notify>,
    acked: usize,
    nacked: usize,
}

#[derive(Default)]
struct BrokerState {
    topics: BTreeSet<String>,
    subscriptions: BTreeMap<String, SubscriptionState>,
    published: BTreeMap<String, Vec<Delivery>>,
    failures: HashSet<(Operation, String)>,
}

impl BrokerState {
    fn check(&self, operation: Operation, resource: &str) -> Result<(), PubSubError> {
        if self.failures.contains(&(operation, resource.to_string())) {
            return Err(PubSubError::Remote {
                operation: operation.to_string(),
                resource: resource.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found(operation: Operation, resource: &str) -> PubSubError {
    PubSubError::NotFound {
        operation: operation.to_string(),
        resource: resource.to_string(),
    }
}

#[derive(Default)]
struct BrokerInner {
    state: Mutex<BrokerState>,
    connections: AtomicUsize,
    closes: AtomicUsize,
    flushes: AtomicUsize,
}

/// Shared state of an in-memory Pub/Sub deployment. Cloning shares the state.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a project-scoped handle, counting it as one connection.
    pub fn connect(&self, project: &str) -> MemoryService {
        self.inner.connections.fetch_add(1, Ordering::SeqCst);
        MemoryService {
            project: project.to_string(),
            broker: self.clone(),
        }
    }

    /// Make every future `operation` on `resource` (a short id) fail.
    pub fn fail_on(&self, operation: Operation, resource: &str) {
        self.inner
            .state
            .lock()
            .failures
            .insert((operation, resource.to_string()));
    }

    pub fn connections(&self) -> usize {
        self.inner.connections.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.inner.flushes.load(Ordering::SeqCst)
    }

    /// Payloads published to a fully qualified topic, oldest first.
    pub fn published(&self, topic: &str) -> Vec<Vec<u8>> {
        self.inner
            .state
            .lock()
            .published
            .get(topic)
            .map(|deliveries| deliveries.iter().map(|d| d.data.clone()).collect())
            .unwrap_or_default()
    }

    /// (acked, nacked) counts for a fully qualified subscription.
    pub fn settled(&self, subscription: &str) -> (usize, usize) {
        self.inner
            .state
            .lock()
            .subscriptions
            .get(subscription)
            .map(|s| (s.acked, s.nacked))
            .unwrap_or_default()
    }

    /// Deliveries still waiting on a fully qualified subscription.
    pub fn pending(&self, subscription: &str) -> usize {
        self.inner
            .state
            .lock()
            .subscriptions
            .get(subscription)
            .map(|s| s.queue.len())
            .unwrap_or_default()
    }
}

/// A project-scoped view of a [`MemoryBroker`].
pub struct MemoryService {
    project: String,
    broker: MemoryBroker,
}

impl MemoryService {
    /// Full names pass through, like the hosted client does with names
    /// containing a '/'.
    fn qualified_topic(&self, topic: &str) -> String {
        if topic.contains('/') {
            topic.to_string()
        } else {
            topic_name(&self.project, topic)
        }
    }

    fn qualified_subscription(&self, subscription: &str) -> String {
        if subscription.contains('/') {
            subscription.to_string()
        } else {
            subscription_name(&self.project, subscription)
        }
    }

    fn publish_to(&self, topic: &str, data: Vec<u8>) -> Result<String, PubSubError> {
        let mut state = self.broker.inner.state.lock();
        state.check(Operation::Publish, topic)?;
        let topic_fqn = topic_name(&self.project, topic);
        if !state.topics.contains(&topic_fqn) {
            return Err(not_found(Operation::Publish, topic));
        }

        let delivery = Delivery {
            id: uuid::Uuid::new_v4().simple().to_string(),
            data,
        };
        for subscription in state.subscriptions.values_mut() {
            if subscription.topic == topic_fqn {
                subscription.queue.push_back(delivery.clone());
                subscription.notify.notify_one();
            }
        }
        let id = delivery.id.clone();
        state.published.entry(topic_fqn).or_default().push(delivery);
        trace!(topic = %topic, message_id = %id, "Published message");
        Ok(id)
    }
}

struct MemoryPublisher {
    topic: String,
    service: MemoryService,
}

#[async_trait]
impl TopicPublisher for MemoryPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, data: Vec<u8>) -> Result<String, PubSubError> {
        self.service.publish_to(&self.topic, data)
    }

    async fn flush(&self) {
        self.service
            .broker
            .inner
            .flushes
            .fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PubSubService for MemoryService {
    fn project(&self) -> &str {
        &self.project
    }

    fn publisher(&self, topic: &str) -> Arc<dyn TopicPublisher> {
        Arc::new(MemoryPublisher {
            topic: topic.to_string(),
            service: MemoryService {
                project: self.project.clone(),
                broker: self.broker.clone(),
            },
        })
    }

    async fn list_topics(&self) -> Result<Vec<String>, PubSubError> {
        let prefix = topic_name(&self.project, "");
        let state = self.broker.inner.state.lock();
        Ok(state
            .topics
            .iter()
            .filter(|t| t.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn create_topic(&self, topic: &str) -> Result<String, PubSubError> {
        let mut state = self.broker.inner.state.lock();
        state.check(Operation::CreateTopic, topic)?;
        let fqn = topic_name(&self.project, topic);
        if !state.topics.insert(fqn.clone()) {
            return Err(PubSubError::AlreadyExists {
                resource: topic.to_string(),
            });
        }
        Ok(fqn)
    }

    async fn delete_topic(&self, topic: &str) -> Result<(), PubSubError> {
        let mut state = self.broker.inner.state.lock();
        state.check(Operation::DeleteTopic, topic)?;
        if !state.topics.remove(&topic_name(&self.project, topic)) {
            return Err(not_found(Operation::DeleteTopic, topic));
        }
        Ok(())
    }

    async fn list_subscriptions(&self, topic: &str) -> Result<Vec<String>, PubSubError> {
        let state = self.broker.inner.state.lock();
        state.check(Operation::ListSubscriptions, topic)?;
        let topic_fqn = topic_name(&self.project, topic);
        if !state.topics.contains(&topic_fqn) {
            return Err(not_found(Operation::ListSubscriptions, topic));
        }
        Ok(state
            .subscriptions
            .iter()
            .filter(|(_, s)| s.topic == topic_fqn)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
    ) -> Result<String, PubSubError> {
        let mut state = self.broker.inner.state.lock();
        state.check(Operation::CreateSubscription, subscription)?;
        let topic_fqn = self.qualified_topic(topic);
        if !state.topics.contains(&topic_fqn) {
            return Err(PubSubError::NotFound {
                operation: format!("create subscription {subscription} on topic"),
                resource: topic.to_string(),
            });
        }
        let fqn = subscription_name(&self.project, subscription);
        if state.subscriptions.contains_key(&fqn) {
            return Err(PubSubError::AlreadyExists {
                resource: subscription.to_string(),
            });
        }
        state.subscriptions.insert(
            fqn.clone(),
            SubscriptionState {
                topic: topic_fqn,
                queue: VecDeque::new(),
                notify: Arc::new(Notify::new()),
                acked: 0,
                nacked: 0,
            },
        );
        Ok(fqn)
    }

    async fn delete_subscription(&self, subscription: &str) -> Result<(), PubSubError> {
        let mut state = self.broker.inner.state.lock();
        state.check(Operation::DeleteSubscription, resource_id(subscription))?;
        match state
            .subscriptions
            .remove(&self.qualified_subscription(subscription))
        {
            Some(removed) => {
                // Wake a receiver so it notices the subscription is gone.
                removed.notify.notify_one();
                Ok(())
            }
            None => Err(not_found(Operation::DeleteSubscription, subscription)),
        }
    }

    async fn receive(
        &self,
        subscription: &str,
        handler: DeliveryHandler,
        cancel: CancellationToken,
    ) -> Result<(), PubSubError> {
        let fqn = subscription_name(&self.project, subscription);
        let missing = || not_found(Operation::Receive, subscription);
        let notify = {
            let state = self.broker.inner.state.lock();
            state.check(Operation::Receive, subscription)?;
            state
                .subscriptions
                .get(&fqn)
                .map(|s| s.notify.clone())
                .ok_or_else(missing)?
        };

        loop {
            if cancel.is_cancelled() {
                debug!(subscription = %subscription, "Receive cancelled");
                return Ok(());
            }

            // Register for the next publish before draining. A stored permit
            // only covers deliveries already in the queue, so it is discarded.
            let mut notified = pin!(notify.notified());
            if notified.as_mut().enable() {
                notified.set(notify.notified());
                notified.as_mut().enable();
            }

            let batch: Vec<Delivery> = {
                let mut state = self.broker.inner.state.lock();
                let entry = state.subscriptions.get_mut(&fqn).ok_or_else(missing)?;
                entry.queue.drain(..).collect()
            };

            let mut acked = 0;
            let mut redeliver = Vec::new();
            for delivery in batch {
                let delivery = Arc::new(delivery);
                match dispatch(&handler, delivery.clone()).await {
                    Disposition::Ack => acked += 1,
                    Disposition::Nack => redeliver.push(Arc::unwrap_or_clone(delivery)),
                }
            }
            if acked > 0 || !redeliver.is_empty() {
                // Nacked deliveries wait for the next pull.
                let mut state = self.broker.inner.state.lock();
                if let Some(entry) = state.subscriptions.get_mut(&fqn) {
                    entry.acked += acked;
                    entry.nacked += redeliver.len();
                    entry.queue.extend(redeliver);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(subscription = %subscription, "Receive cancelled");
                    return Ok(());
                }
                _ = notified => {}
            }
        }
    }

    async fn close(&self) -> Result<(), PubSubError> {
        self.broker.inner.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
