//! Query execution engine.
//!
//! This module submits read-only queries to ClickHouse and hands back a typed
//! cursor over the result:
//! - `SELECT` statements without a `LIMIT` get one appended
//! - results are requested as `JSONCompactEachRowWithNamesAndTypes`, so column
//!   names and engine types arrive ahead of the rows
//! - engine rejections become [`DbError::Execution`]

use crate::db::cursor::HttpRowCursor;
use crate::db::pool::{Connection, http_error};
use crate::error::{DbError, DbResult};
use std::borrow::Cow;
use tracing::debug;

/// Wire format requested for every query result.
pub const RESULT_FORMAT: &str = "JSONCompactEachRowWithNamesAndTypes";

/// Append `LIMIT <limit>` to a `SELECT` that does not mention `LIMIT` anywhere.
///
/// The check is a case-insensitive substring test, not a tokenizer: a `limit`
/// inside a string literal, comment or subquery also suppresses the rewrite.
/// Other statements (`SHOW`, `DESCRIBE`) are returned unchanged.
pub fn apply_row_limit(query: &str, limit: u32) -> Cow<'_, str> {
    let upper = query.to_uppercase();
    if upper.trim().starts_with("SELECT") && !upper.contains("LIMIT") {
        Cow::Owned(format!("{query} LIMIT {limit}"))
    } else {
        Cow::Borrowed(query)
    }
}

/// Submits queries on an open connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute `query` and return a cursor over its rows.
    ///
    /// The cursor borrows `conn`; the caller drops it before releasing the connection.
    pub async fn execute<'conn>(
        &self,
        conn: &'conn Connection,
        query: &str,
        limit: u32,
    ) -> DbResult<HttpRowCursor<'conn>> {
        let query = apply_row_limit(query, limit);

        debug!(
            sql = %query,
            limit = limit,
            database = %conn.database(),
            "Executing query"
        );

        let response = conn
            .request(&query, Some(RESULT_FORMAT))
            .send()
            .await
            .map_err(|e| DbError::execution(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::execution(http_error(status, &body)));
        }

        HttpRowCursor::open(conn, response).await
    }
}
