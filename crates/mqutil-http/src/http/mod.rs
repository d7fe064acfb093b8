pub mod error;
pub mod relay;

pub use error::RelayError;
pub use relay::server::{RelayConfig, bind, serve, start_relay};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub topic: String,
}
