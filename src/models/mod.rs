//! Data models for the local MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{ClientSettings, ConnectionConfig};
pub use query::{
    ColumnDescriptor, DEFAULT_ROW_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_ROW_LIMIT, MAX_SEARCH_LIMIT,
};
