//! Schema listing tools.
//!
//! This module implements the `clickhouse-schemas` and `clickhouse-tables` MCP
//! tools. Both run a fixed `SHOW` statement through the same execute-and-render
//! path as the query tool, bounded by the maximum row limit.

use crate::db::ConnectionProvider;
use crate::error::{DbError, DbResult};
use crate::models::ConnectionConfig;
use crate::tools::query::execute_and_render;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database name to list tables from (optional, uses CLICKHOUSE_DATABASE if not specified)
    #[serde(default)]
    pub database: Option<String>,
}

/// Quote a database name for use after `FROM`.
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}

/// Handler for schema listing tools.
pub struct SchemaToolHandler {
    provider: Arc<ConnectionProvider>,
    connection: Option<ConnectionConfig>,
}

impl SchemaToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>, connection: Option<ConnectionConfig>) -> Self {
        Self {
            provider,
            connection,
        }
    }

    /// List all databases on the server.
    pub async fn list_schemas(&self) -> DbResult<String> {
        let config = self.connection.as_ref().ok_or(DbError::ConfigMissing)?;
        let limit = self.provider.settings().max_row_limit;

        let output = execute_and_render(&self.provider, config, "SHOW DATABASES", limit)
            .await
            .map_err(|e| e.during("Failed to list databases"))?;

        info!(address = %config.address(), "Listed databases");
        Ok(output)
    }

    /// List the tables of `input.database`, or of the configured database.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<String> {
        let config = self.connection.as_ref().ok_or(DbError::ConfigMissing)?;
        let database = Self::target_database(config, input.database.as_deref());
        let limit = self.provider.settings().max_row_limit;

        let sql = format!("SHOW TABLES FROM {}", quote_identifier(database));
        let output = execute_and_render(&self.provider, config, &sql, limit)
            .await
            .map_err(|e| e.during(format!("Failed to list tables from database '{database}'")))?;

        info!(database = %database, "Listed tables");
        Ok(output)
    }

    fn target_database<'a>(config: &'a ConnectionConfig, requested: Option<&'a str>) -> &'a str {
        requested
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .unwrap_or(&config.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientSettings;

    fn handler(connection: Option<ConnectionConfig>) -> SchemaToolHandler {
        let provider = Arc::new(ConnectionProvider::new(ClientSettings::default()).unwrap());
        SchemaToolHandler::new(provider, connection)
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("default"), "`default`");
        assert_eq!(quote_identifier("my db"), "`my db`");
        assert_eq!(quote_identifier("a`b"), "`a\\`b`");
        assert_eq!(quote_identifier("a\\b"), "`a\\\\b`");
    }

    #[test]
    fn test_target_database_defaults_to_config() {
        let config = ConnectionConfig::new("localhost").with_database("analytics");
        assert_eq!(SchemaToolHandler::target_database(&config, None), "analytics");
        assert_eq!(SchemaToolHandler::target_database(&config, Some("")), "analytics");
        assert_eq!(SchemaToolHandler::target_database(&config, Some("  ")), "analytics");
        assert_eq!(SchemaToolHandler::target_database(&config, Some("logs")), "logs");
    }

    #[test]
    fn test_list_tables_input_deserialization() {
        let input: ListTablesInput = serde_json::from_str("{}").unwrap();
        assert!(input.database.is_none());

        let input: ListTablesInput = serde_json::from_str(r#"{"database": "system"}"#).unwrap();
        assert_eq!(input.database.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_missing_config_reported() {
        let handler = handler(None);
        assert!(matches!(
            handler.list_schemas().await,
            Err(DbError::ConfigMissing)
        ));
        assert!(matches!(
            handler.list_tables(ListTablesInput::default()).await,
            Err(DbError::ConfigMissing)
        ));
    }
}
