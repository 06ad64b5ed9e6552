//! Local MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to run read-only ClickHouse queries and search the web.

use clap::Parser;
use local_mcp::config::{Config, TransportMode};
use local_mcp::db::ConnectionProvider;
use local_mcp::mcp::LocalMcpService;
use local_mcp::tools::SearchToolHandler;
use local_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting Local MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let connection = config.connection_config();
    match &connection {
        Some(conn) => info!(
            address = %conn.address(),
            database = %conn.database,
            secure = conn.secure,
            "ClickHouse tools enabled"
        ),
        None => warn!("CLICKHOUSE_HOST is not set; ClickHouse tools will report a configuration error"),
    }

    let provider = Arc::new(ConnectionProvider::new(config.client_settings())?);
    let search = Arc::new(SearchToolHandler::new(
        &config.search_endpoint,
        config.search_timeout_duration(),
    )?);
    let service = LocalMcpService::new(provider, connection, search);

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(service).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                service,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
