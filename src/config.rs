//! Configuration handling for the local MCP server.
//!
//! This module provides configuration management via CLI arguments and environment variables.
//! The ClickHouse settings read the same `CLICKHOUSE_*` variables an editor integration sets.

use crate::models::connection::{
    DEFAULT_CLICKHOUSE_DATABASE, DEFAULT_CLICKHOUSE_PORT, DEFAULT_CLICKHOUSE_USERNAME,
    DEFAULT_CONN_LIFETIME_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_EXECUTION_TIME_SECS, DEFAULT_QUERY_TIMEOUT_SECS,
};
use crate::models::{ClientSettings, ConnectionConfig, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};
use crate::tools::search::{DEFAULT_SEARCH_ENDPOINT, DEFAULT_SEARCH_TIMEOUT_SECS};
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for editor integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Only the literal `true` (any case) enables TLS.
fn parse_secure(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "local-mcp",
    about = "MCP server for read-only ClickHouse queries and web search",
    version,
    author
)]
pub struct Config {
    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// ClickHouse host. Without it the ClickHouse tools report a configuration error.
    #[arg(long, env = "CLICKHOUSE_HOST")]
    pub clickhouse_host: Option<String>,

    /// ClickHouse HTTP interface port
    #[arg(long, default_value_t = DEFAULT_CLICKHOUSE_PORT, env = "CLICKHOUSE_PORT")]
    pub clickhouse_port: u16,

    /// Default ClickHouse database
    #[arg(long, default_value = DEFAULT_CLICKHOUSE_DATABASE, env = "CLICKHOUSE_DATABASE")]
    pub clickhouse_database: String,

    /// ClickHouse user
    #[arg(long, default_value = DEFAULT_CLICKHOUSE_USERNAME, env = "CLICKHOUSE_USERNAME")]
    pub clickhouse_username: String,

    /// ClickHouse password (sensitive - not logged)
    #[arg(long, default_value = "", env = "CLICKHOUSE_PASSWORD", hide_env_values = true)]
    pub clickhouse_password: String,

    /// Use HTTPS for ClickHouse ("true" to enable)
    #[arg(
        long,
        default_value = "false",
        env = "CLICKHOUSE_SECURE",
        action = ArgAction::Set,
        value_parser = parse_secure
    )]
    pub clickhouse_secure: bool,

    /// Rows returned when the caller gives no limit
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT, env = "MCP_DEFAULT_ROW_LIMIT")]
    pub default_row_limit: u32,

    /// Upper bound for the row limit
    #[arg(long, default_value_t = MAX_ROW_LIMIT, env = "MCP_MAX_ROW_LIMIT")]
    pub max_row_limit: u32,

    /// Query timeout in seconds, covering connect, execution and rendering
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "MCP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Server-side execution limit in seconds (`max_execution_time`)
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_EXECUTION_TIME_SECS,
        env = "MCP_MAX_EXECUTION_TIME"
    )]
    pub max_execution_time: u64,

    /// Maximum concurrent ClickHouse connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "MCP_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Idle connection lifetime in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONN_LIFETIME_SECS,
        env = "MCP_CONN_LIFETIME"
    )]
    pub conn_lifetime: u64,

    /// Web search endpoint (DuckDuckGo Instant Answer API)
    #[arg(long, default_value = DEFAULT_SEARCH_ENDPOINT, env = "MCP_SEARCH_ENDPOINT")]
    pub search_endpoint: String,

    /// Web search request timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_SEARCH_TIMEOUT_SECS,
        env = "MCP_SEARCH_TIMEOUT"
    )]
    pub search_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            clickhouse_host: None,
            clickhouse_port: DEFAULT_CLICKHOUSE_PORT,
            clickhouse_database: DEFAULT_CLICKHOUSE_DATABASE.to_string(),
            clickhouse_username: DEFAULT_CLICKHOUSE_USERNAME.to_string(),
            clickhouse_password: String::new(),
            clickhouse_secure: false,
            default_row_limit: DEFAULT_ROW_LIMIT,
            max_row_limit: MAX_ROW_LIMIT,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            conn_lifetime: DEFAULT_CONN_LIFETIME_SECS,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            search_timeout: DEFAULT_SEARCH_TIMEOUT_SECS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// The ClickHouse target, or `None` when no host is set.
    ///
    /// Empty database and user values fall back to `default`.
    pub fn connection_config(&self) -> Option<ConnectionConfig> {
        let host = self
            .clickhouse_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())?;

        let or_default = |value: &str, default: &str| {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        Some(ConnectionConfig {
            host: host.to_string(),
            port: self.clickhouse_port,
            database: or_default(&self.clickhouse_database, DEFAULT_CLICKHOUSE_DATABASE),
            username: or_default(&self.clickhouse_username, DEFAULT_CLICKHOUSE_USERNAME),
            password: self.clickhouse_password.clone(),
            secure: self.clickhouse_secure,
        })
    }

    /// Client settings for the connection provider.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            default_row_limit: self.default_row_limit,
            max_row_limit: self.max_row_limit,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            query_timeout: Duration::from_secs(self.query_timeout),
            max_execution_time_secs: self.max_execution_time,
            max_connections: self.max_connections,
            conn_lifetime: Duration::from_secs(self.conn_lifetime),
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the search request timeout as a Duration.
    pub fn search_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.search_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
