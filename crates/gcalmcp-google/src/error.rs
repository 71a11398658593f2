//! Error types for Calendar API operations.
//!
//! Every failure of a Calendar API call, a batch round trip or the batch
//! response parser is a [`ProviderError`]. Per-calendar failures inside a
//! successful batch are not errors at this level; they are recorded in the
//! batch outcome instead.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Access token missing, expired or rejected.
    AuthenticationFailed,
    /// Token is valid but lacks access to the resource (403).
    AuthorizationFailed,
    /// Connection-level failure, timeout, DNS resolution, etc.
    NetworkError,
    /// Too many requests (429).
    RateLimited,
    /// Server returned an error (5xx, or any unexpected status).
    ServerError,
    /// Response could not be parsed, including malformed batch bodies.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was rejected as invalid (400).
    BadRequest,
    /// Invalid client configuration or batch input.
    ConfigurationError,
    /// Broken internal invariant.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while talking to the Calendar API.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Maps a non-success HTTP status and its body to an error.
    ///
    /// The message is taken from Google's `{"error": {"message": ...}}`
    /// envelope when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = google_error_message(body)
            .unwrap_or_else(|| body.trim().to_string());
        let detail = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("{} (HTTP {})", detail, status)
        };

        match status {
            400 => Self::bad_request(detail),
            401 => Self::authentication(detail),
            403 => Self::authorization(detail),
            404 => Self::not_found(detail),
            429 => Self::rate_limited(detail),
            _ => Self::server(detail),
        }
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Text shown to the end user after `Error: ` in a tool result.
    pub fn user_message(&self) -> String {
        match self.code {
            ProviderErrorCode::AuthenticationFailed => format!(
                "Authentication failed: {}. Please re-authenticate with Google and \
                 retry with a fresh access token.",
                self.message
            ),
            ProviderErrorCode::AuthorizationFailed => {
                format!("Access denied: {}", self.message)
            }
            ProviderErrorCode::RateLimited => {
                format!("Rate limit exceeded: {}", self.message)
            }
            ProviderErrorCode::NotFound => format!("Not found: {}", self.message),
            ProviderErrorCode::InvalidResponse => {
                format!("Unexpected response from Google Calendar: {}", self.message)
            }
            ProviderErrorCode::InternalError => format!("Internal error: {}", self.message),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

fn google_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
