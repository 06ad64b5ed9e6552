//! SQL statement validation for read-only enforcement.
//!
//! The query tool only runs statements that textually begin with a read-only
//! keyword. This is a prefix allow-list on the raw text, not a parser: it does
//! not look past the first keyword, so anything that does not start with one of
//! the allowed keywords is rejected before a connection is opened.

use crate::error::{DbError, DbResult};

/// Keywords a statement may start with.
pub const READ_ONLY_PREFIXES: [&str; 3] = ["SELECT", "SHOW", "DESCRIBE"];

/// Check whether `query` starts with an allowed keyword.
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use local_mcp::tools::sql_validator::is_query_safe;
///
/// assert!(is_query_safe("  select 1"));
/// assert!(!is_query_safe("DROP TABLE t"));
/// ```
pub fn is_query_safe(query: &str) -> bool {
    let normalized = query.trim().to_uppercase();
    READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Validate SQL for read-only execution in the query tool.
///
/// Returns `Err(DbError::UnsafeQuery)` when the statement does not start with
/// `SELECT`, `SHOW` or `DESCRIBE`.
pub fn validate_readonly(query: &str) -> DbResult<()> {
    if is_query_safe(query) {
        Ok(())
    } else {
        Err(DbError::UnsafeQuery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_queries() {
        for query in [
            "SELECT 1",
            "select * from users limit 10",
            "SHOW TABLES",
            "show databases",
            "DESCRIBE users",
            "describe table_name",
            "\n\t  SeLeCt now()",
        ] {
            assert!(is_query_safe(query), "expected safe: {query}");
        }
    }

    #[test]
    fn test_unsafe_queries() {
        for query in [
            "DROP TABLE test",
            "DELETE FROM users",
            "INSERT INTO logs VALUES (1, 'test')",
            "UPDATE users SET name = 'hacker'",
            "CREATE TABLE malicious (id Int32)",
            "ALTER TABLE users ADD COLUMN evil String",
            "-- comment\nSELECT 1",
            "/* SELECT */ DROP TABLE t",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "",
            "   ",
        ] {
            assert!(!is_query_safe(query), "expected unsafe: {query}");
        }
    }

    #[test]
    fn test_prefix_only_check() {
        // Only the first keyword is inspected.
        assert!(is_query_safe("SELECT 1; DROP TABLE t"));
        assert!(is_query_safe("SHOWCASE"));
    }

    #[test]
    fn test_validate_readonly_error_kind() {
        assert!(validate_readonly("SELECT 1").is_ok());
        assert!(matches!(
            validate_readonly("TRUNCATE TABLE t"),
            Err(DbError::UnsafeQuery)
        ));
    }
}
