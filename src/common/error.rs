//! Error types for minielect

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    #[error("Not connected: no coordination session established")]
    NotConnected,

    #[error("Connection lost: {0}")]
    ConnectionLoss(String),

    #[error("Session expired")]
    SessionExpired,

    // === Namespace Errors ===
    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("Node not found: {0}")]
    NoNode(String),

    #[error("No children under: {0}")]
    NoChildren(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Payload is not valid UTF-8 at {0}")]
    BadPayload(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NotConnected | Error::ConnectionLoss(_) | Error::SessionExpired
        )
    }

    /// Is this the create-if-absent race? Idempotent bootstrap treats it as success.
    pub fn is_node_exists(&self) -> bool {
        matches!(self, Error::NodeExists(_))
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
