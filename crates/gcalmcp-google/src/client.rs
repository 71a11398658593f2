//! Authenticated access to the Calendar API host.
//!
//! [`AuthorizedClient`] is the capability every tool handler works through:
//! it hands out the current access token and performs authenticated calls.
//! [`GoogleClient`] implements it over `reqwest` for one bearer token.

use std::future::Future;
use std::pin::Pin;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::GoogleConfig;
use crate::error::{ProviderError, ProviderResult};

/// A boxed future, used to keep [`AuthorizedClient`] object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent verbatim with the given content type.
    Raw { content_type: String, body: String },
}

/// One call against the API host.
///
/// `path` starts with `/` and already includes the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<ApiBody>,
    /// Overrides the client's own token for this call.
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Creates a request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Builder method to attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(ApiBody::Json(body));
        self
    }

    /// Builder method to attach a raw body.
    #[must_use]
    pub fn with_raw_body(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        self.body = Some(ApiBody::Raw {
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }

    /// Builder method to set an explicit bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// A response whose body has been read in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Creates a JSON response (used by fakes and tests).
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, Some("application/json; charset=UTF-8"), body.to_string())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts non-2xx responses into a [`ProviderError`].
    pub fn error_for_status(self) -> ProviderResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProviderError::from_status(self.status, &self.body))
        }
    }

    /// Deserializes the body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> ProviderResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_source(e)
        })
    }
}

/// An authenticated handle on the Calendar API.
///
/// Implementations are bound to one user's credentials.
pub trait AuthorizedClient: Send + Sync {
    /// Returns a usable access token, refreshing it if the implementation
    /// can.
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;

    /// Performs one authenticated HTTP call.
    ///
    /// Only connection-level failures are errors; any HTTP status is
    /// returned as an [`ApiResponse`].
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ProviderResult<ApiResponse>>;
}

/// [`AuthorizedClient`] backed by `reqwest` and a caller-supplied token.
///
/// The token is used as-is; obtaining and refreshing it is the caller's
/// business.
pub struct GoogleClient {
    http_client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GoogleClient {
    /// Creates a client for `access_token`.
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> ProviderResult<Self> {
        let api_base = config.validated_base()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base,
            access_token: access_token.into(),
        })
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn execute(&self, request: ApiRequest) -> ProviderResult<ApiResponse> {
        let url = format!("{}{}", self.api_base, request.path);
        let token = match request.bearer {
            Some(token) => token,
            None => self.current_token()?,
        };

        debug!(method = %request.method, path = %request.path, "calendar api request");

        let mut builder = self
            .http_client
            .request(request.method, &url)
            .bearer_auth(token);

        builder = match request.body {
            Some(ApiBody::Json(value)) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            Some(ApiBody::Raw { content_type, body }) => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            ProviderError::network(message).with_source(e)
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
        })?;

        debug!(status, bytes = body.len(), "calendar api response");

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }

    fn current_token(&self) -> ProviderResult<String> {
        if self.access_token.trim().is_empty() {
            return Err(ProviderError::authentication("no access token provided"));
        }
        Ok(self.access_token.clone())
    }
}

impl AuthorizedClient for GoogleClient {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let token = self.current_token();
        Box::pin(async move { token })
    }

    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ProviderResult<ApiResponse>> {
        Box::pin(self.execute(request))
    }
}
