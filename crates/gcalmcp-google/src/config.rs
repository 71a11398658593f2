//! Calendar API client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Default API host. Both the REST endpoints and the batch endpoint live here.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Settings shared by every client the server creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    /// Scheme and host requests are sent to, without a trailing slash.
    pub api_base: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GoogleConfig {
    /// Builder method to point the client at another host (tests, proxies).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Builder method to set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that `api_base` is an absolute http(s) URL and returns it
    /// without a trailing slash.
    pub fn validated_base(&self) -> ProviderResult<String> {
        let url = Url::parse(&self.api_base).map_err(|e| {
            ProviderError::configuration(format!("invalid api base '{}': {}", self.api_base, e))
                .with_source(e)
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "api base must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(self.api_base.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn defaults() {
        let config = GoogleConfig::default();
        assert_eq!(config.api_base, "https://www.googleapis.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn trailing_slash_is_removed() {
        let config = GoogleConfig::default().with_api_base("http://127.0.0.1:8080/");
        assert_eq!(config.validated_base().unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn rejects_bad_base() {
        let err = GoogleConfig::default()
            .with_api_base("not a url")
            .validated_base()
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        let err = GoogleConfig::default()
            .with_api_base("ftp://example.com")
            .validated_base()
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }
}
