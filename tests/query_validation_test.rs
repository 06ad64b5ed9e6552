//! Integration tests for query validation.
//!
//! These tests verify that the query tool rejects anything that does not start
//! with a read-only keyword, before any configuration or connection is needed.

use local_mcp::db::{ConnectionProvider, apply_row_limit};
use local_mcp::error::DbError;
use local_mcp::models::{ClientSettings, ConnectionConfig};
use local_mcp::tools::query::{QueryInput, QueryToolHandler};
use local_mcp::tools::sql_validator::{is_query_safe, validate_readonly};
use std::sync::Arc;

fn handler(connection: Option<ConnectionConfig>) -> QueryToolHandler {
    let provider = Arc::new(ConnectionProvider::new(ClientSettings::default()).unwrap());
    QueryToolHandler::new(provider, connection)
}

/// Test that write statements are rejected with UnsafeQuery.
#[test]
fn test_query_rejects_writes() {
    for sql in [
        "INSERT INTO users (name) VALUES ('test')",
        "UPDATE users SET name = 'changed' WHERE id = 1",
        "DELETE FROM users WHERE id = 1",
        "CREATE TABLE test (id Int32) ENGINE = Memory",
        "DROP TABLE users",
        "TRUNCATE TABLE users",
        "ALTER TABLE users DELETE WHERE 1",
        "OPTIMIZE TABLE users FINAL",
        "SYSTEM DROP DNS CACHE",
        "KILL QUERY WHERE 1",
    ] {
        let err = validate_readonly(sql).unwrap_err();
        assert!(
            matches!(err, DbError::UnsafeQuery),
            "Should be UnsafeQuery for {sql}, got: {err:?}"
        );
    }
}

/// Test that read-only statements pass.
#[test]
fn test_query_allows_reads() {
    for sql in [
        "SELECT * FROM users",
        "select count() from system.parts",
        "SHOW DATABASES",
        "show create table users",
        "DESCRIBE TABLE users",
        "  describe users",
    ] {
        assert!(validate_readonly(sql).is_ok(), "{sql} should be allowed");
    }
}

/// Leading comments and CTEs are rejected; only the first keyword is checked.
#[test]
fn test_query_prefix_semantics() {
    assert!(!is_query_safe("-- read\nSELECT 1"));
    assert!(!is_query_safe("WITH 1 AS x SELECT x"));
    assert!(!is_query_safe("EXPLAIN SELECT 1"));
    assert!(is_query_safe("SELECT 1; DROP TABLE users"));
}

/// Test the rejection message shown to the caller.
#[tokio::test]
async fn test_unsafe_query_message() {
    let err = handler(None)
        .query(QueryInput {
            query: "DELETE FROM users".to_string(),
            limit: None,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Only SELECT, SHOW, and DESCRIBE queries are allowed for security reasons"
    );
}

/// Missing configuration is reported for a safe query.
#[tokio::test]
async fn test_missing_configuration_message() {
    let err = handler(None)
        .query(QueryInput {
            query: "SELECT 1".to_string(),
            limit: None,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "ClickHouse configuration not found in environment variables. Please check your settings."
    );
}

/// Blank queries are rejected before the safety check.
#[tokio::test]
async fn test_blank_query_message() {
    let err = handler(Some(ConnectionConfig::new("localhost")))
        .query(QueryInput {
            query: "\n\t ".to_string(),
            limit: None,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Query parameter is required and must be a non-empty string"
    );
}

/// The row limit is appended to SELECT only, and only once.
#[test]
fn test_row_limit_rewrite() {
    assert_eq!(apply_row_limit("SELECT 1", 100), "SELECT 1 LIMIT 100");
    assert_eq!(apply_row_limit("SHOW TABLES", 100), "SHOW TABLES");
    assert_eq!(apply_row_limit("select * from t limit 5", 100), "select * from t limit 5");

    let once = apply_row_limit("SELECT * FROM t", 10).into_owned();
    assert_eq!(apply_row_limit(&once, 10), once);
}
