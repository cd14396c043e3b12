use thiserror::Error;

use crate::helpers::http_client::TransportError;

/// Malformed or unexpected data received from the device
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Malformed JSON: {0}")]
    Json(String),

    #[error("Unexpected shape: {0}")]
    UnexpectedShape(String),
}

/// Errors that can occur in the Bang & Olufsen integration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BeoError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Recognized notification type that the integration ignores
    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Controller is not running")]
    NotRunning,
}
