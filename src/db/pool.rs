//! Connection pool management.
//!
//! ClickHouse is reached through its HTTP interface. A single `reqwest::Client`
//! keeps the keep-alive pool; a semaphore bounds how many connections may be
//! checked out at once. Each [`Connection`] owns one permit and returns it when
//! dropped, so every exit path releases its slot.

use crate::error::{DbError, DbResult};
use crate::models::{ClientSettings, ConnectionConfig};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";

/// Opens verified connections to ClickHouse.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    client: reqwest::Client,
    settings: ClientSettings,
    permits: Arc<Semaphore>,
}

impl ConnectionProvider {
    /// Create a provider with the given limits.
    pub fn new(settings: ClientSettings) -> DbResult<Self> {
        settings.validate().map_err(DbError::internal)?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .pool_max_idle_per_host(settings.max_connections as usize)
            .pool_idle_timeout(settings.conn_lifetime)
            .gzip(true)
            .user_agent(concat!("local-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DbError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            permits: Arc::new(Semaphore::new(settings.max_connections as usize)),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Number of connections that can be opened right now.
    pub fn available_connections(&self) -> usize {
        self.permits.available_permits()
    }

    /// Open a connection and verify it with a liveness query.
    ///
    /// On failure the connection slot is released before the error is returned.
    pub async fn connect(&self, config: &ConnectionConfig) -> DbResult<Connection> {
        let endpoint = config
            .endpoint_url()
            .map_err(|e| DbError::connection(format!("failed to open connection: {e}")))?;

        let permit = match timeout(
            self.settings.connect_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(DbError::internal("connection pool is closed")),
            Err(_) => {
                return Err(DbError::connection(format!(
                    "failed to open connection: all {} connections are in use",
                    self.settings.max_connections
                )));
            }
        };

        debug!(
            address = %config.address(),
            database = %config.database,
            secure = config.secure,
            "Opening ClickHouse connection"
        );

        let conn = Connection {
            client: self.client.clone(),
            endpoint,
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            max_execution_time_secs: self.settings.max_execution_time_secs,
            _permit: permit,
        };

        if let Err(message) = conn.ping().await {
            warn!(address = %config.address(), error = %message, "ClickHouse ping failed");
            drop(conn);
            return Err(DbError::connection(format!(
                "failed to ping ClickHouse: {message}"
            )));
        }

        info!(
            address = %config.address(),
            database = %config.database,
            "Connected to ClickHouse"
        );
        Ok(conn)
    }
}

/// An open, verified connection. Dropping it returns the slot to the pool.
pub struct Connection {
    client: reqwest::Client,
    endpoint: Url,
    database: String,
    username: String,
    password: String,
    max_execution_time_secs: u64,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Database the connection targets.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Build an authenticated request carrying `sql` as the body.
    pub(crate) fn request(&self, sql: &str, default_format: Option<&str>) -> reqwest::RequestBuilder {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("database", &self.database);
            query.append_pair("enable_http_compression", "1");
            query.append_pair(
                "max_execution_time",
                &self.max_execution_time_secs.to_string(),
            );
            // NaN and infinities are written as null otherwise
            query.append_pair("output_format_json_quote_denormals", "1");
            if let Some(format) = default_format {
                query.append_pair("default_format", format);
            }
        }

        self.client
            .post(url)
            .header(USER_HEADER, &self.username)
            .header(KEY_HEADER, &self.password)
            .body(sql.to_string())
    }

    async fn ping(&self) -> Result<(), String> {
        let response = self
            .request("SELECT 1", None)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(http_error(status, &body))
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint.as_str())
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, "ClickHouse connection released");
    }
}

/// Describe a non-success HTTP response using the server's error text.
pub(crate) fn http_error(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), body)
    }
}
