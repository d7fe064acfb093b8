use std::fmt;

/// Errors reported by a [`PubSubService`](crate::service::PubSubService) or by
/// session acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum PubSubError {
    AlreadyExists {
        resource: String,
    },
    NotFound {
        operation: String,
        resource: String,
    },
    /// The client could not be constructed or authenticated.
    Connection {
        reason: String,
    },
    Remote {
        operation: String,
        resource: String,
        message: String,
    },
}

impl fmt::Display for PubSubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PubSubError::AlreadyExists { resource } => write!(f, "'{resource}' already exists"),
            PubSubError::NotFound {
                operation,
                resource,
            } => write!(f, "Failed to {operation} '{resource}': not found"),
            PubSubError::Connection { reason } => {
                write!(f, "Failed to connect to Pub/Sub: {reason}")
            }
            PubSubError::Remote {
                operation,
                resource,
                message,
            } => write!(f, "Failed to {operation} '{resource}': {message}"),
        }
    }
}

impl std::error::Error for PubSubError {}

impl PubSubError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, PubSubError::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PubSubError::NotFound { .. })
    }

    /// Classify a gRPC status by its numeric code.
    ///
    /// The numeric form keeps this independent of the tonic version the
    /// Pub/Sub client links against.
    pub fn from_grpc(code: i32, message: &str, operation: &str, resource: &str) -> Self {
        match tonic::Code::from(code) {
            tonic::Code::AlreadyExists => PubSubError::AlreadyExists {
                resource: resource.to_string(),
            },
            tonic::Code::NotFound => PubSubError::NotFound {
                operation: operation.to_string(),
                resource: resource.to_string(),
            },
            other => PubSubError::Remote {
                operation: operation.to_string(),
                resource: resource.to_string(),
                message: format!("{other:?}: {message}"),
            },
        }
    }
}
