//! MCP service implementation using rmcp.
//!
//! This module defines the LocalMcpService struct with the ClickHouse and web
//! search tools exposed via the MCP protocol using the rmcp framework's macros.
//! Tool failures are reported as `is_error` results carrying the error text,
//! never as protocol errors.

use crate::db::ConnectionProvider;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{ListTablesInput, SchemaToolHandler};
use crate::tools::search::{SearchInput, SearchToolHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct LocalMcpService {
    /// Shared ClickHouse connection provider
    provider: Arc<ConnectionProvider>,
    /// Handler for `clickhouse-query`
    query: Arc<QueryToolHandler>,
    /// Handler for `clickhouse-schemas` and `clickhouse-tables`
    schema: Arc<SchemaToolHandler>,
    /// Handler for `search-web`
    search: Arc<SearchToolHandler>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl LocalMcpService {
    /// Create a new LocalMcpService instance.
    ///
    /// # Arguments
    ///
    /// * `provider` - Shared ClickHouse connection provider
    /// * `connection` - ClickHouse target, `None` when no host is configured
    /// * `search` - Web search handler
    pub fn new(
        provider: Arc<ConnectionProvider>,
        connection: Option<ConnectionConfig>,
        search: Arc<SearchToolHandler>,
    ) -> Self {
        Self {
            query: Arc::new(QueryToolHandler::new(
                Arc::clone(&provider),
                connection.clone(),
            )),
            schema: Arc::new(SchemaToolHandler::new(Arc::clone(&provider), connection)),
            provider,
            search,
            tool_router: Self::tool_router(),
        }
    }

    /// Connection slots not held by an in-flight tool call.
    pub fn available_connections(&self) -> usize {
        self.provider.available_connections()
    }

    /// Usage notes sent to the client, with the configured row limits.
    fn instructions(&self) -> String {
        let settings = self.provider.settings();
        format!(
            "Read-only ClickHouse access and web search.\n\
            \n\
            ## Workflow\n\
            1. Call `clickhouse-schemas` to see the available databases\n\
            2. Call `clickhouse-tables` to list the tables of a database\n\
            3. Use `clickhouse-query` with SELECT, SHOW or DESCRIBE statements\n\
            \n\
            ## Limits\n\
            - `clickhouse-query` returns at most {} rows by default, up to {} with `limit`\n\
            - `search-web` returns at most {} results by default, up to {} with `limit`",
            settings.default_row_limit,
            settings.max_row_limit,
            DEFAULT_SEARCH_LIMIT,
            MAX_SEARCH_LIMIT,
        )
    }
}

/// Turn a handler outcome into a tool result.
fn tool_result(tool: &str, outcome: DbResult<Vec<String>>) -> CallToolResult {
    match outcome {
        Ok(blocks) => CallToolResult::success(blocks.into_iter().map(Content::text).collect()),
        Err(e) => {
            log_failure(tool, &e);
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

fn log_failure(tool: &str, e: &DbError) {
    if e.is_rejected_input() {
        warn!(tool = tool, error = %e, "Tool call rejected");
    } else {
        error!(tool = tool, error = %e, "Tool call failed");
    }
}

#[tool_router]
impl LocalMcpService {
    #[tool(
        name = "search-web",
        description = "Search the web using DuckDuckGo. Returns a list of search results with titles, URLs, and descriptions."
    )]
    async fn search_web(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result("search-web", self.search.search(input).await))
    }

    #[tool(
        name = "clickhouse-query",
        description = "Execute a read-only SQL query against ClickHouse.\nOnly SELECT, SHOW and DESCRIBE statements are allowed.\nA LIMIT is added to SELECT queries that do not have one."
    )]
    async fn clickhouse_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.query.query(input).await.map(|text| vec![text]);
        Ok(tool_result("clickhouse-query", outcome))
    }

    #[tool(
        name = "clickhouse-schemas",
        description = "List all databases (schemas) on the ClickHouse server."
    )]
    async fn clickhouse_schemas(&self) -> Result<CallToolResult, McpError> {
        let outcome = self.schema.list_schemas().await.map(|text| vec![text]);
        Ok(tool_result("clickhouse-schemas", outcome))
    }

    #[tool(
        name = "clickhouse-tables",
        description = "List all tables in a ClickHouse database.\nUses the configured database when none is given."
    )]
    async fn clickhouse_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.schema.list_tables(input).await.map(|text| vec![text]);
        Ok(tool_result("clickhouse-tables", outcome))
    }
}

#[tool_handler]
impl ServerHandler for LocalMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "local-mcp".to_owned(),
                title: Some("Local MCP".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }
}
