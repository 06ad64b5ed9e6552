//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `query`: Execute read-only ClickHouse queries
//! - `schema`: List databases and tables
//! - `search`: Search the web through DuckDuckGo
//! - `format`: Render a result cursor as a text table
//! - `limit`: Resolve loosely-typed limit arguments
//! - `sql_validator`: SQL statement validation for read-only enforcement

pub mod format;
pub mod limit;
pub mod query;
pub mod schema;
pub mod search;
pub mod sql_validator;

pub use query::{QueryInput, QueryToolHandler};
pub use schema::{ListTablesInput, SchemaToolHandler};
pub use search::{SearchInput, SearchResult, SearchToolHandler};
