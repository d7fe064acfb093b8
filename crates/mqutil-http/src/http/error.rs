//! Error types for the HTTP relay

use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    Bind { address: String, reason: String },
    Serve { reason: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Bind { address, reason } => {
                write!(f, "Failed to bind to address {address}: {reason}")
            }
            RelayError::Serve { reason } => write!(f, "Relay server error: {reason}"),
        }
    }
}

impl std::error::Error for RelayError {}
