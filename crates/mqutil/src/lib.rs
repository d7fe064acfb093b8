//! Core of the `mqutil` message-queue utilities: the Pub/Sub service
//! abstraction and its backends, session lifecycle, and shutdown handling.

pub mod error;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod telemetry;

pub use error::PubSubError;
pub use service::{
    Delivery, DeliveryHandler, Disposition, MemoryBroker, PubSubService, TopicPublisher,
};
pub use session::{Connector, GcloudConnector, Session, SessionConfig, with_session};
pub use shutdown::{SHUTDOWN_GRACE, signal_token};
