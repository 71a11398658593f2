//! JSON-RPC dispatch.
//!
//! Both transports hand raw messages to [`RequestHandler`], together with the
//! bearer token the message arrived with. The handler answers every request
//! with exactly one response and stays silent for notifications.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Span, debug, info, warn};

use gcalmcp_google::ProviderError;
use gcalmcp_protocol::{
    CallToolParams, ErrorCode, InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ProtocolError, ToolResult, decode_line,
};

use crate::client_store::ClientStore;
use crate::tools::{self, Tool};

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "gcalmcp";

/// Routes MCP requests to the tools.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    clients: Arc<ClientStore>,
}

impl RequestHandler {
    /// Creates a handler resolving clients through `clients`.
    pub fn new(clients: Arc<ClientStore>) -> Self {
        Self { clients }
    }

    /// Decodes and handles one raw message.
    ///
    /// Returns `None` when no response must be sent.
    pub async fn handle_message(&self, raw: &[u8], bearer: Option<&str>) -> Option<JsonRpcResponse> {
        let value: Value = match decode_line(raw) {
            Ok(value) => value,
            Err(ProtocolError::Serialization(e)) => {
                debug!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
                ));
            }
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(ErrorCode::InvalidRequest, e.to_string()),
                ));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request, bearer).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(ErrorCode::InvalidRequest, format!("Invalid request: {}", e)),
            )),
        }
    }

    /// Handles a decoded request.
    #[tracing::instrument(skip_all, fields(method = %request.method, duration_ms))]
    pub async fn handle(&self, request: JsonRpcRequest, bearer: Option<&str>) -> Option<JsonRpcResponse> {
        let start = std::time::Instant::now();

        if request.is_notification() {
            debug!("notification received");
            return None;
        }

        if let Some(version) = request.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                return Some(JsonRpcResponse::failure(
                    request.id,
                    JsonRpcError::new(
                        ErrorCode::InvalidRequest,
                        format!("unsupported jsonrpc version '{}'", version),
                    ),
                ));
            }
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            "initialize" => {
                info!("client initializing");
                to_value(&InitializeResult::tools_only(
                    SERVER_NAME,
                    env!("CARGO_PKG_VERSION"),
                ))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => match self.call_tool(request.params, bearer).await {
                Ok(result) => to_value(&result),
                Err(error) => Err(error),
            },
            other => {
                debug!(method = other, "unknown method");
                Err(JsonRpcError::new(
                    ErrorCode::MethodNotFound,
                    format!("Method not found: {}", other),
                ))
            }
        };

        let duration = start.elapsed();
        if tracing::enabled!(tracing::Level::DEBUG) {
            Span::current().record("duration_ms", duration.as_millis());
            debug!(duration_ms = duration.as_millis(), "request handled");
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<ToolResult, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::new(ErrorCode::InvalidParams, "missing params"))
            .and_then(|params| {
                serde_json::from_value(params).map_err(|e| {
                    JsonRpcError::new(ErrorCode::InvalidParams, format!("Invalid params: {}", e))
                })
            })?;

        let tool = Tool::from_name(&params.name).ok_or_else(|| {
            JsonRpcError::new(
                ErrorCode::InvalidParams,
                format!("Unknown tool: {}", params.name),
            )
        })?;

        let token = match bearer.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                warn!(tool = tool.name(), "tool call without bearer token");
                let error = ProviderError::authentication("missing bearer token");
                return Ok(ToolResult::error(error.user_message()));
            }
        };

        let client = match self.clients.get(token) {
            Ok(client) => client,
            Err(e) => return Ok(ToolResult::error(e.user_message())),
        };

        debug!(tool = tool.name(), "calling tool");
        Ok(tool.call(client.as_ref(), &params.arguments).await)
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcalmcp_google::testing::{RecordingClient, batch_response};
    use gcalmcp_google::{ApiResponse, AuthorizedClient, ProviderResult};

    fn handler_with(client: Arc<RecordingClient>) -> RequestHandler {
        let store = ClientStore::new(Arc::new(
            move |_token: &str| -> ProviderResult<Arc<dyn AuthorizedClient>> {
                Ok(client.clone())
            },
        ));
        RequestHandler::new(Arc::new(store))
    }

    fn handler() -> RequestHandler {
        handler_with(Arc::new(RecordingClient::new()))
    }

    async fn send(handler: &RequestHandler, message: Value, bearer: Option<&str>) -> JsonRpcResponse {
        handler
            .handle_message(message.to_string().as_bytes(), bearer)
            .await
            .expect("response expected")
    }

    #[tokio::test]
    async fn initialize_announces_tools() {
        let response = send(
            &handler(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            None,
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"], json!({"tools": {}}));
        assert_eq!(result["serverInfo"]["name"], "gcalmcp");
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let response = handler()
            .handle_message(
                br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                None,
            )
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn ping_and_tools_list() {
        let handler = handler();
        let pong = send(&handler, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}), None).await;
        assert_eq!(pong.result, Some(json!({})));
        assert_eq!(pong.id, Some(json!("p")));

        let list = send(&handler, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}), None).await;
        let names: Vec<String> = list.result.unwrap()["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"list-events".to_string()));
        assert_eq!(names.len(), 8);
    }

    #[tokio::test]
    async fn protocol_errors() {
        let handler = handler();

        let unknown = send(&handler, json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}), None).await;
        assert_eq!(unknown.error.unwrap().code, -32601);

        let bad_params = send(
            &handler,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"arguments": {}}}),
            None,
        )
        .await;
        assert_eq!(bad_params.error.unwrap().code, -32602);

        let unknown_tool = send(
            &handler,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope"}}),
            None,
        )
        .await;
        assert_eq!(unknown_tool.error.unwrap().code, -32602);

        let garbage = handler.handle_message(b"{not json", None).await.unwrap();
        assert_eq!(garbage.error.unwrap().code, -32700);
        assert_eq!(garbage.id, None);
    }

    #[tokio::test]
    async fn tool_call_without_token_is_an_error_result() {
        let response = send(
            &handler(),
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call",
                   "params": {"name": "list-calendars", "arguments": {}}}),
            None,
        )
        .await;

        assert!(response.error.is_none());
        let result: ToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(result.is_error());
        assert!(result.first_text().contains("re-authenticate"));
    }

    #[tokio::test]
    async fn tool_call_lists_several_calendars_in_one_call() {
        let client = Arc::new(RecordingClient::new().with_response(batch_response(
            "b",
            &[
                (200, r#"{"items": [{"id": "x", "start": {"dateTime": "2024-01-15T10:00:00Z"}}]}"#),
                (200, r#"{"items": [{"id": "y", "start": {"dateTime": "2024-01-15T08:00:00Z"}}]}"#),
            ],
        )));
        let handler = handler_with(Arc::clone(&client));

        let response = send(
            &handler,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
                "name": "list-events",
                "arguments": {"calendarId": ["primary", "work"], "timeMin": "2024-01-01T00:00:00Z"}
            }}),
            Some("token"),
        )
        .await;

        let result: ToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(!result.is_error());
        assert!(result.first_text().starts_with("Found 2 events across 2 calendars:"));
        assert_eq!(client.call_count(), 1);
    }
}
