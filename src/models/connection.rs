//! Connection-related data models.
//!
//! This module defines the per-call ClickHouse connection configuration and the
//! immutable client settings shared by the connection provider and executor.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::query::{DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};

pub const DEFAULT_CLICKHOUSE_PORT: u16 = 8123;
pub const DEFAULT_CLICKHOUSE_DATABASE: &str = "default";
pub const DEFAULT_CLICKHOUSE_USERNAME: &str = "default";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_EXECUTION_TIME_SECS: u64 = 60;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONN_LIFETIME_SECS: u64 = 600;

/// Configuration for a ClickHouse connection.
///
/// Built from the process configuration for each tool call and dropped when the
/// call returns.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    pub password: String,
    /// Use HTTPS for the HTTP interface
    #[serde(default)]
    pub secure: bool,
}

impl ConnectionConfig {
    /// Create a config with the default port, database and user.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_CLICKHOUSE_PORT,
            database: DEFAULT_CLICKHOUSE_DATABASE.to_string(),
            username: DEFAULT_CLICKHOUSE_USERNAME.to_string(),
            password: String::new(),
            secure: false,
        }
    }

    /// Return a copy targeting another database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Address of the HTTP interface, e.g. `http://localhost:8123/`.
    pub fn endpoint_url(&self) -> Result<Url, String> {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.host.trim();
        // Bare IPv6 literals need brackets inside a URL.
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Url::parse(&format!("{scheme}://{host}:{}/", self.port))
            .map_err(|e| format!("invalid ClickHouse address '{}:{}': {e}", self.host, self.port))
    }

    /// `host:port` for log fields.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("secure", &self.secure)
            .finish()
    }
}

/// Limits, timeouts and pool sizes used by the connection provider and executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Rows returned when the caller does not pass a limit
    pub default_row_limit: u32,
    /// Upper bound for any caller-supplied limit
    pub max_row_limit: u32,
    /// TCP/TLS dial timeout
    pub connect_timeout: Duration,
    /// Client-side bound on a whole database operation
    pub query_timeout: Duration,
    /// Server-side `max_execution_time` setting, in seconds
    pub max_execution_time_secs: u64,
    /// Maximum open connections; the idle pool has the same size
    pub max_connections: u32,
    /// How long an idle pooled connection is kept before it is closed
    pub conn_lifetime: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            default_row_limit: DEFAULT_ROW_LIMIT,
            max_row_limit: MAX_ROW_LIMIT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            max_execution_time_secs: DEFAULT_MAX_EXECUTION_TIME_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            conn_lifetime: Duration::from_secs(DEFAULT_CONN_LIFETIME_SECS),
        }
    }
}

impl ClientSettings {
    /// Validate settings and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_row_limit == 0 {
            return Err("max_row_limit must be greater than 0".to_string());
        }
        if self.default_row_limit == 0 {
            return Err("default_row_limit must be greater than 0".to_string());
        }
        if self.default_row_limit > self.max_row_limit {
            return Err(format!(
                "default_row_limit ({}) cannot exceed max_row_limit ({})",
                self.default_row_limit, self.max_row_limit
            ));
        }
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        if self.query_timeout.is_zero() {
            return Err("query_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}
