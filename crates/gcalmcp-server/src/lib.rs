//! MCP server exposing Google Calendar tools.
//!
//! This crate provides:
//! - Tool argument validation
//! - The calendar tools, including multi-calendar listing through the batch
//!   endpoint
//! - A per-token client store
//! - JSON-RPC dispatch over HTTP (`POST /mcp`) and stdio
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gcalmcp_server::{ClientStore, RequestHandler, ServerConfig, http};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let handler = RequestHandler::new(Arc::new(ClientStore::google(config.google_config())));
//!     let listener = tokio::net::TcpListener::bind(config.bind).await?;
//!     http::serve(listener, handler, config.max_body_bytes, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod cli;
mod client_store;
mod config;
mod error;
mod handler;
pub mod http;
pub mod stdio;
pub mod tools;

pub use args::{CalendarSelection, ValidationError};
pub use client_store::{ClientFactory, ClientStore};
pub use config::{ServerConfig, Transport};
pub use error::{ServerError, ServerResult};
pub use handler::{RequestHandler, SERVER_NAME};
pub use tools::{BatchListEventsHandler, Tool, ToolError};
