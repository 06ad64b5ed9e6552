//! Error types for the local MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! The display strings are what the caller sees in a failed tool result, so they are
//! written as complete, user-facing sentences.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error(
        "ClickHouse configuration not found in environment variables. Please check your settings."
    )]
    ConfigMissing,

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Only SELECT, SHOW, and DESCRIBE queries are allowed for security reasons")]
    UnsafeQuery,

    #[error("Failed to connect to ClickHouse: {message}\nPlease verify your connection settings.")]
    Connection { message: String },

    #[error("query execution failed: {message}")]
    Execution { message: String },

    #[error("failed to scan row: column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("error iterating rows: {message}")]
    Iteration { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Search failed: {message}")]
    Search { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Names the tool action that failed, keeping the underlying error as the source.
    #[error("{action}: {source}")]
    Operation {
        action: String,
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an execution error for a query the engine rejected.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a decode error for a cell that does not match its column type.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an iteration error for a failure surfaced while walking the cursor.
    pub fn iteration(message: impl Into<String>) -> Self {
        Self::Iteration {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a search error.
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wrap this error with the name of the action that failed.
    ///
    /// Configuration, input and connection errors already read as complete
    /// messages and are returned unchanged.
    pub fn during(self, action: impl Into<String>) -> Self {
        match self {
            Self::ConfigMissing
            | Self::InvalidInput { .. }
            | Self::UnsafeQuery
            | Self::Connection { .. } => self,
            other => Self::Operation {
                action: action.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check whether the error happened before any connection attempt was made.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing | Self::InvalidInput { .. } | Self::UnsafeQuery
        )
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
