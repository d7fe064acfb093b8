pub mod metadata;
pub mod producer;
pub mod routes;
pub mod server;

pub use server::start_relay;
