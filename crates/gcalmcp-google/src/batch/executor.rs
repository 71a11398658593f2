//! The single network round trip of a batch listing.

use reqwest::Method;
use tracing::{debug, warn};

use super::request::{BATCH_PATH, BatchEnvelope};
use crate::client::{ApiRequest, AuthorizedClient};
use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};

/// Raw multipart answer of the batch endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatchResponse {
    /// `Content-Type` of the response; carries the response boundary.
    pub content_type: String,
    pub body: String,
}

/// POSTs `envelope` to the batch endpoint.
///
/// Exactly one [`AuthorizedClient::send`] is made, after a token was
/// obtained. Nothing is retried.
pub async fn execute(
    client: &dyn AuthorizedClient,
    envelope: &BatchEnvelope,
) -> ProviderResult<RawBatchResponse> {
    let token = client.access_token().await.map_err(|e| {
        if e.code() == ProviderErrorCode::AuthenticationFailed {
            e
        } else {
            ProviderError::authentication(format!("could not obtain access token: {}", e.message()))
                .with_source(e)
        }
    })?;

    let request = ApiRequest::new(Method::POST, BATCH_PATH)
        .with_raw_body(envelope.content_type(), envelope.body())
        .with_bearer(token);

    debug!(
        sub_requests = envelope.requests().len(),
        boundary = envelope.boundary(),
        "sending batch request"
    );

    let response = client.send(request).await?;

    if !response.is_success() {
        warn!(status = response.status, "batch request rejected");
        return Err(match response.status {
            401 => ProviderError::authentication(
                "access token expired or invalid",
            ),
            status => ProviderError::from_status(status, &response.body),
        });
    }

    let content_type = response.content_type.ok_or_else(|| {
        ProviderError::invalid_response("batch response has no Content-Type header")
    })?;

    Ok(RawBatchResponse {
        content_type,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventFilters;
    use crate::client::{ApiBody, ApiResponse, GoogleClient};
    use crate::config::GoogleConfig;
    use crate::testing::{RecordingClient, batch_response};
    use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn envelope(ids: &[&str]) -> BatchEnvelope {
        let ids: Vec<String> = ids.iter().map(|v| v.to_string()).collect();
        BatchEnvelope::build_with_boundary(
            &ids,
            &EventFilters::new("2024-01-01T00:00:00Z"),
            "batch_req",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn one_post_with_boundary_and_token() {
        let client = RecordingClient::new()
            .with_response(batch_response("batch_resp", &[(200, "{}"), (200, "{}")]));

        let raw = execute(&client, &envelope(&["a", "b"])).await.unwrap();
        assert_eq!(raw.content_type, "multipart/mixed; boundary=batch_resp");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/batch/calendar/v3");
        assert_eq!(request.bearer.as_deref(), Some("test-token"));
        match &request.body {
            Some(ApiBody::Raw { content_type, body }) => {
                assert_eq!(content_type, "multipart/mixed; boundary=batch_req");
                assert!(body.ends_with("--batch_req--"));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_request_without_token() {
        let client = RecordingClient::without_token();
        let err = execute(&client, &envelope(&["a", "b"])).await.unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let client = RecordingClient::new();
        let err = execute(&client, &envelope(&["a", "b"])).await.unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn batch_level_unauthorized() {
        let client = RecordingClient::new().with_response(ApiResponse::new(401, None, ""));
        let err = execute(&client, &envelope(&["a", "b"])).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn batch_level_server_error() {
        let client =
            RecordingClient::new().with_response(ApiResponse::new(503, None, "unavailable"));
        let err = execute(&client, &envelope(&["a", "b"])).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
    }

    #[tokio::test]
    async fn missing_content_type_is_invalid() {
        let client = RecordingClient::new().with_response(ApiResponse::new(200, None, "--x--"));
        let err = execute(&client, &envelope(&["a", "b"])).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/batch/calendar/v3"))
            .and(header("authorization", "Bearer test-token"))
            .and(header_regex("content-type", "^multipart/mixed; boundary=batch_req$"))
            .and(body_string_contains("Content-ID: <item2>"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "--batch_resp--\r\n",
                    "multipart/mixed; boundary=batch_resp",
                ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = GoogleConfig::default().with_api_base(server.uri());
        let client = GoogleClient::new(&config, "test-token").unwrap();

        let raw = execute(&client, &envelope(&["primary", "work@example.com"]))
            .await
            .unwrap();
        assert_eq!(raw.content_type, "multipart/mixed; boundary=batch_resp");
    }
}
