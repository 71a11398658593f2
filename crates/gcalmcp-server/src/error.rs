//! Server error types.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server or one of its transports.
///
/// Failures inside a tool call never become a `ServerError`; they are
/// rendered into the tool result text.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener, stdin/stdout, config file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Message framing error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] gcalmcp_protocol::ProtocolError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failed to set up logging.
    #[error("Tracing error: {0}")]
    Tracing(#[from] gcalmcp_core::TracingError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
