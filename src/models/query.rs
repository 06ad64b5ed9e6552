//! Query-related data models.

use serde::{Deserialize, Serialize};

/// Default row limit for query results.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 1000;

/// Default number of web search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Maximum number of web search results.
pub const MAX_SEARCH_LIMIT: u32 = 20;

/// Name and engine type tag of one result column, known before any row is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Type as reported by ClickHouse, e.g. `Nullable(UInt32)`
    pub type_name: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}
