//! Server configuration.
//!
//! Settings come from `~/.config/gcalmcp/config.toml` (or `--config`) and
//! are then overridden by command-line flags.
//!
//! ```toml
//! transport = "http"
//! bind = "127.0.0.1:3000"
//! api_base = "https://www.googleapis.com"
//! request_timeout_secs = 30
//! max_body_bytes = 4194304
//! log_format = "compact"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gcalmcp_core::TracingOutputFormat;
use gcalmcp_google::{DEFAULT_API_BASE, GoogleConfig};
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `POST /mcp`, one bearer token per request.
    #[default]
    Http,
    /// Newline-delimited JSON on stdin/stdout, one token for the process.
    Stdio,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Transport to serve.
    pub transport: Transport,

    /// Listen address of the HTTP transport.
    pub bind: SocketAddr,

    /// Calendar API host.
    pub api_base: String,

    /// Timeout of each Calendar API call, in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted HTTP request body.
    pub max_body_bytes: usize,

    /// Log line format.
    pub log_format: TracingOutputFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Http,
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 4 * 1024 * 1024,
            log_format: TracingOutputFormat::Compact,
        }
    }
}

impl ServerConfig {
    /// Loads the default config file, or defaults if it does not exist.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ServerError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gcalmcp")
            .join("config.toml")
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ServerError::config("request_timeout_secs must be positive"));
        }
        if self.max_body_bytes == 0 {
            return Err(ServerError::config("max_body_bytes must be positive"));
        }
        self.google_config()
            .validated_base()
            .map_err(|e| ServerError::config(e.message().to_string()))?;
        Ok(())
    }

    /// Builder: set the transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Builder: set the HTTP listen address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set the Calendar API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Settings for the Calendar API clients.
    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig::default()
            .with_api_base(self.api_base.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}
