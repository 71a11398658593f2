//! HTTP transport.
//!
//! `POST /mcp` carries one JSON-RPC message per request body and takes the
//! caller's Google access token from `Authorization: Bearer <token>`.
//! `GET /health` answers `ok`.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::ServerResult;
use crate::handler::RequestHandler;

/// Builds the router for `handler`.
pub fn router(handler: RequestHandler, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(handler)
}

/// Serves requests on `listener` until `shutdown` completes.
pub async fn serve<S>(
    listener: TcpListener,
    handler: RequestHandler,
    max_body_bytes: usize,
    shutdown: S,
) -> ServerResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "HTTP transport listening");
    axum::serve(listener, router(handler, max_body_bytes))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP transport stopped");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn mcp(State(handler): State<RequestHandler>, headers: HeaderMap, body: Bytes) -> Response {
    let bearer = bearer_token(&headers);
    match handler.handle_message(&body, bearer).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Extracts the token of an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::http::HeaderValue;
    use gcalmcp_google::testing::RecordingClient;
    use gcalmcp_google::{ApiResponse, AuthorizedClient, ProviderResult};
    use gcalmcp_protocol::ToolResult;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;

    use crate::client_store::ClientStore;

    struct TestServer {
        addr: SocketAddr,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    async fn start(client: Arc<RecordingClient>, max_body_bytes: usize) -> TestServer {
        let store = ClientStore::new(Arc::new(
            move |_token: &str| -> ProviderResult<Arc<dyn AuthorizedClient>> {
                Ok(client.clone())
            },
        ));
        let handler = RequestHandler::new(Arc::new(store));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, handler, max_body_bytes, async move {
            let _ = rx.await;
        }));

        TestServer {
            addr,
            shutdown: Some(tx),
        }
    }

    async fn post(server: &TestServer, body: String, token: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .post(format!("http://{}/mcp", server.addr))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    #[test]
    fn bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ya29.abc"));
        assert_eq!(bearer_token(&headers), Some("ya29.abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  tok "));
        assert_eq!(bearer_token(&headers), Some("tok"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn health_check() {
        let server = start(Arc::new(RecordingClient::new()), 1024).await;
        let response = reqwest::get(format!("http://{}/health", server.addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn tool_call_with_bearer() {
        let client = Arc::new(RecordingClient::new().with_response(ApiResponse::json(
            200,
            &json!({"items": [{"id": "primary", "summary": "Me"}]}),
        )));
        let server = start(Arc::clone(&client), 64 * 1024).await;

        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                          "params": {"name": "list-calendars", "arguments": {}}});
        let response = post(&server, body.to_string(), Some("ya29.token")).await;
        assert_eq!(response.status(), 200);

        let value: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
        let result: ToolResult = serde_json::from_value(value["result"].clone()).unwrap();
        assert_eq!(result.first_text(), "Me (primary)");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn tool_call_without_bearer_reports_authentication() {
        let client = Arc::new(RecordingClient::new());
        let server = start(Arc::clone(&client), 64 * 1024).await;

        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                          "params": {"name": "list-colors", "arguments": {}}});
        let response = post(&server, body.to_string(), None).await;
        assert_eq!(response.status(), 200);

        let value: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
        let text = value["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: Authentication failed: missing bearer token."));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let server = start(Arc::new(RecordingClient::new()), 1024).await;
        let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let response = post(&server, body.to_string(), None).await;
        assert_eq!(response.status(), 202);
        assert!(response.text().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = start(Arc::new(RecordingClient::new()), 64).await;
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "ping", "params": {"pad": "x".repeat(200)}});
        let response = post(&server, body.to_string(), None).await;
        assert_eq!(response.status(), 413);
    }
}
