//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use gcalmcp_core::{TracingConfig, TracingOutputFormat};

use crate::config::{ServerConfig, Transport};
use crate::error::ServerResult;

/// gcalmcp - Google Calendar tools for MCP clients
#[derive(Debug, Parser)]
#[command(name = "gcalmcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GCALMCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Transport to serve on
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,

    /// Listen address of the HTTP transport
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Calendar API host (for testing against a local server)
    #[arg(long, env = "GCALMCP_API_BASE")]
    pub api_base: Option<String>,

    /// Google access token used by the stdio transport
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Log line format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log format names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => TracingOutputFormat::Pretty,
            LogFormat::Compact => TracingOutputFormat::Compact,
            LogFormat::Json => TracingOutputFormat::Json,
        }
    }
}

impl Cli {
    /// Loads the config file (explicit path, else the default location) and
    /// applies command-line overrides on top.
    pub fn load_config(&self) -> ServerResult<ServerConfig> {
        let config = match &self.config {
            Some(path) => ServerConfig::load_from(path)?,
            None => ServerConfig::load()?,
        };
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides to `config`.
    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(transport) = self.transport {
            config = config.with_transport(transport);
        }
        if let Some(bind) = self.bind {
            config = config.with_bind(bind);
        }
        if let Some(api_base) = &self.api_base {
            config = config.with_api_base(api_base.clone());
        }
        if let Some(format) = self.log_format {
            config.log_format = format.into();
        }
        config
    }

    /// Tracing settings for this invocation.
    pub fn tracing_config(&self, config: &ServerConfig) -> TracingConfig {
        let base = if self.debug {
            TracingConfig::debug()
        } else {
            TracingConfig::default()
        };
        base.with_format(config.log_format)
    }
}
