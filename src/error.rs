//! Error types for the slot container.

use thiserror::Error;

/// Main error type for container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Nested notification depth exceeded (limit {limit})")]
    NotifyDepthExceeded { limit: usize },

    #[error("Container has been dropped")]
    ContainerDropped,
}

impl From<serde_json::Error> for ContainerError {
    fn from(e: serde_json::Error) -> Self {
        ContainerError::Serialization(e.to_string())
    }
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
