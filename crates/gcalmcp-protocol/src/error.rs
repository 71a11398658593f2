//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while framing or decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message exceeds maximum allowed size.
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Payload is not valid JSON for the expected type.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Line contained nothing but whitespace.
    #[error("empty message")]
    EmptyMessage,
}
