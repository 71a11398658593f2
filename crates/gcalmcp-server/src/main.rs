use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use gcalmcp_core::init_tracing;
use gcalmcp_server::cli::Cli;
use gcalmcp_server::{
    ClientStore, RequestHandler, ServerConfig, ServerResult, Transport, http, stdio,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(cli.tracing_config(&config)) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config, cli.access_token).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig, access_token: Option<String>) -> ServerResult<()> {
    let clients = Arc::new(ClientStore::google(config.google_config()));
    let handler = RequestHandler::new(clients);

    info!(
        transport = ?config.transport,
        api_base = %config.api_base,
        "starting gcalmcp"
    );

    match config.transport {
        Transport::Http => {
            let listener = tokio::net::TcpListener::bind(config.bind).await?;
            http::serve(listener, handler, config.max_body_bytes, shutdown_signal()).await
        }
        Transport::Stdio => {
            if access_token.is_none() {
                info!("no access token given; tool calls will report an authentication error");
            }
            stdio::serve_stdio(handler, access_token).await
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
