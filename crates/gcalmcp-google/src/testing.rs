//! In-memory [`AuthorizedClient`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{ApiRequest, ApiResponse, AuthorizedClient, BoxFuture};
use crate::error::{ProviderError, ProviderResult};

/// Replays queued responses and records every request it receives.
///
/// Each [`AuthorizedClient::send`] counts as one network call.
#[derive(Debug)]
pub struct RecordingClient {
    token: Option<String>,
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingClient {
    /// A client holding the token `test-token` and no queued responses.
    pub fn new() -> Self {
        Self {
            token: Some("test-token".to_string()),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose token cannot be obtained.
    pub fn without_token() -> Self {
        Self {
            token: None,
            ..Self::new()
        }
    }

    /// Queues the response returned by the next unanswered call.
    #[must_use]
    pub fn with_response(self, response: ApiResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of network calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl AuthorizedClient for RecordingClient {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let token = self
            .token
            .clone()
            .ok_or_else(|| ProviderError::authentication("token refresh failed"));
        Box::pin(async move { token })
    }

    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ProviderResult<ApiResponse>> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| ProviderError::network("no response queued"));
        Box::pin(async move { response })
    }
}

/// Builds a multipart batch response body from `(status, json body)` parts,
/// the way the batch endpoint frames them.
pub fn batch_response_body(boundary: &str, parts: &[(u16, &str)]) -> String {
    let mut body = String::new();
    for (index, (status, json)) in parts.iter().enumerate() {
        body.push_str(&format!(
            "--{boundary}\r\n\
             Content-Type: application/http\r\n\
             Content-ID: <response-item{}>\r\n\
             \r\n\
             HTTP/1.1 {} {}\r\n\
             Content-Type: application/json; charset=UTF-8\r\n\
             \r\n\
             {}\r\n",
            index + 1,
            status,
            reason_phrase(*status),
            json
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

/// A successful batch [`ApiResponse`] built by [`batch_response_body`].
pub fn batch_response(boundary: &str, parts: &[(u16, &str)]) -> ApiResponse {
    ApiResponse::new(
        200,
        Some(&format!("multipart/mixed; boundary={}", boundary)),
        batch_response_body(boundary, parts),
    )
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        _ => "Error",
    }
}
