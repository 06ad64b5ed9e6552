//! Query execution tool.
//!
//! This module implements the `clickhouse-query` MCP tool. Only statements that
//! start with SELECT, SHOW or DESCRIBE are executed; everything else is rejected
//! before a connection is opened.

use crate::db::{ConnectionProvider, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::ConnectionConfig;
use crate::tools::format;
use crate::tools::limit::resolve_limit;
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::info;

pub(crate) const EMPTY_QUERY_MESSAGE: &str =
    "Query parameter is required and must be a non-empty string";

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL query to execute against ClickHouse. Only SELECT, SHOW and DESCRIBE are allowed.
    pub query: String,
    /// Maximum number of rows to return (default: 100, max: 1000)
    #[serde(default)]
    pub limit: Option<JsonValue>,
}

/// Connect, run `sql` and render the result, releasing the cursor and then the
/// connection on every path.
pub(crate) async fn execute_and_render(
    provider: &ConnectionProvider,
    config: &ConnectionConfig,
    sql: &str,
    limit: u32,
) -> DbResult<String> {
    let query_timeout = provider.settings().query_timeout;

    let work = async {
        let conn = provider.connect(config).await?;
        let mut cursor = QueryExecutor::new().execute(&conn, sql, limit).await?;
        let rendered = format::render(&mut cursor, limit).await;
        drop(cursor);
        drop(conn);
        rendered
    };

    match timeout(query_timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(DbError::timeout(
            "query execution",
            query_timeout.as_secs(),
        )),
    }
}

/// Handler for query execution.
pub struct QueryToolHandler {
    provider: Arc<ConnectionProvider>,
    connection: Option<ConnectionConfig>,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    ///
    /// `connection` is `None` when no ClickHouse host is configured; calls then
    /// fail with [`DbError::ConfigMissing`].
    pub fn new(provider: Arc<ConnectionProvider>, connection: Option<ConnectionConfig>) -> Self {
        Self {
            provider,
            connection,
        }
    }

    /// Handle the query tool call.
    pub async fn query(&self, input: QueryInput) -> DbResult<String> {
        if input.query.trim().is_empty() {
            return Err(DbError::invalid_input(EMPTY_QUERY_MESSAGE));
        }
        sql_validator::validate_readonly(&input.query)?;

        let config = self.connection.as_ref().ok_or(DbError::ConfigMissing)?;
        let settings = self.provider.settings();
        let limit = resolve_limit(
            input.limit.as_ref(),
            settings.default_row_limit,
            settings.max_row_limit,
        );

        let start = Instant::now();
        let output = execute_and_render(&self.provider, config, &input.query, limit)
            .await
            .map_err(|e| e.during("Query execution failed"))?;

        info!(
            database = %config.database,
            limit = limit,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(output)
    }
}
