//! Relay Common Error Types
//!
//! Centralized error handling for all Relay components

use std::fmt;

/// Main error type for Relay operations
#[derive(Debug)]
pub enum RelayError {
    /// Generic error with message
    Generic(String),
    /// IO-related errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serde(serde_json::Error),
    /// Configuration errors
    Config(String),
    /// The response body receiver is gone; the client disconnected
    Disconnected,
    /// A frame or response did not follow the wire grammar
    Protocol(String),
    /// A frame was routed to an element that does not exist
    MissingTarget(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Generic(msg) => write!(f, "Relay error: {}", msg),
            RelayError::Io(err) => write!(f, "IO error: {}", err),
            RelayError::Serde(err) => write!(f, "Serialization error: {}", err),
            RelayError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RelayError::Disconnected => write!(f, "Client disconnected"),
            RelayError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            RelayError::MissingTarget(id) => write!(f, "Missing target element: {}", id),
        }
    }
}

impl std::error::Error for RelayError {}

/// Convenience result type for Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

// Implement From traits for common error types
impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Io(err)
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serde(err)
    }
}

impl From<toml::de::Error> for RelayError {
    fn from(err: toml::de::Error) -> Self {
        RelayError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Generic(err.to_string())
    }
}
