pub mod gcloud;
pub mod memory;
pub mod r#trait;

// Re-exports for ergonomics
pub use gcloud::GcloudService;
pub use memory::{MemoryBroker, MemoryService, Operation};
pub use r#trait::{
    Delivery, DeliveryHandler, Disposition, PubSubService, TopicPublisher, resource_id,
};

/// Fully qualified topic name, as the service reports it.
pub fn topic_name(project: &str, topic: &str) -> String {
    format!("projects/{project}/topics/{topic}")
}

/// Fully qualified subscription name, as the service reports it.
pub fn subscription_name(project: &str, subscription: &str) -> String {
    format!("projects/{project}/subscriptions/{subscription}")
}
