//! Model Context Protocol messages for gcalmcp.
//!
//! MCP runs JSON-RPC 2.0. Over stdio every message is one line of JSON;
//! over HTTP every POST body is one message. This crate holds the message
//! types both transports share and the line framing used by stdio.
//!
//! ```rust
//! use gcalmcp_protocol::{JsonRpcRequest, decode_line};
//!
//! let request: JsonRpcRequest =
//!     decode_line(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
//! assert_eq!(request.method, "ping");
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_line, encode_line};
pub use types::{
    CallToolParams, ErrorCode, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ServerInfo, TextContent, ToolDefinition, ToolResult,
};

/// JSON-RPC version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision announced during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Maximum size of one framed message (4 MB).
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;
