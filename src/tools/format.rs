//! Result rendering for MCP tools.
//!
//! Walks a row cursor, decodes each row according to its column types and
//! renders a delimiter-joined text table:
//!
//! ```text
//! Query Results:
//!
//! id | name
//! ---------
//! 1 | a
//!
//! Total rows: 1
//! ```

use crate::db::{RowCursor, RowDecoder};
use crate::error::DbResult;
use std::fmt::Write as _;
use tracing::debug;

/// Separator between column names and between values.
pub const DELIMITER: &str = " | ";

/// Render at most `limit` rows of `cursor` as a text table.
///
/// A decode failure or a cursor error aborts rendering; no partial table is returned.
pub async fn render<C: RowCursor>(cursor: &mut C, limit: u32) -> DbResult<String> {
    let decoder = RowDecoder::new(cursor.columns());
    let header = cursor
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(DELIMITER);

    let mut output = String::from("Query Results:\n\n");
    output.push_str(&header);
    output.push('\n');
    // One dash per byte of the header line.
    output.push_str(&"-".repeat(header.len()));
    output.push('\n');

    let limit = limit as usize;
    let mut row_count = 0usize;
    while row_count < limit {
        let Some(cells) = cursor.next_row().await? else {
            break;
        };
        let line = decoder
            .decode(&cells)?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(DELIMITER);
        output.push_str(&line);
        output.push('\n');
        row_count += 1;
    }

    if row_count == 0 {
        output.push_str("No rows returned.\n");
    } else {
        let _ = write!(output, "\nTotal rows: {row_count}");
        if row_count >= limit {
            let _ = write!(output, " (limited to {limit})");
        }
        output.push('\n');
    }

    debug!(rows = row_count, limit = limit, "Rendered query results");
    Ok(output)
}
