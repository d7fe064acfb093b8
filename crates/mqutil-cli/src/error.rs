use std::fmt;

use mqutil::PubSubError;
use mqutil_http::RelayError;

#[derive(Debug)]
pub enum CliError {
    /// A flag was missing or malformed. Raised before any connection is made.
    Validation {
        field: String,
        message: String,
    },
    Io {
        context: String,
        reason: String,
    },
    PubSub(PubSubError),
    Relay(RelayError),
}

impl CliError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CliError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, error: std::io::Error) -> Self {
        CliError::Io {
            context: context.into(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Validation { field, message } => {
                write!(f, "Invalid {field}: {message}")
            }
            CliError::Io { context, reason } => write!(f, "Failed to {context}: {reason}"),
            CliError::PubSub(e) => write!(f, "{e}"),
            CliError::Relay(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::PubSub(e) => Some(e),
            CliError::Relay(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PubSubError> for CliError {
    fn from(error: PubSubError) -> Self {
        CliError::PubSub(error)
    }
}

impl From<RelayError> for CliError {
    fn from(error: RelayError) -> Self {
        CliError::Relay(error)
    }
}
