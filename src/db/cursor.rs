//! Forward-only row cursors.
//!
//! A cursor exposes the column descriptors of an executing query and yields its
//! rows one at a time as raw JSON cells. Decoding into typed values happens in
//! [`crate::db::types`]; the cursor only frames the wire stream.

use crate::db::pool::Connection;
use crate::error::{DbError, DbResult};
use crate::models::ColumnDescriptor;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

/// One undecoded result row.
pub type RawRow = Vec<JsonValue>;

/// Longest single line of a result body that is buffered before giving up.
pub const MAX_RESULT_LINE_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// Forward-only access to the rows of one query.
pub trait RowCursor: Send {
    /// Columns of the result, available before any row is read.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Fetch the next row, `Ok(None)` once the result is exhausted.
    ///
    /// Failures that surface while walking the result (transport errors, a server
    /// exception after the first rows were sent) are reported as
    /// [`DbError::Iteration`].
    fn next_row(&mut self) -> impl Future<Output = DbResult<Option<RawRow>>> + Send;
}

/// Cursor over a `JSONCompactEachRowWithNamesAndTypes` HTTP response body.
///
/// The cursor borrows the connection it was opened on, so it is always dropped
/// before that connection is released. Dropping the cursor aborts the response
/// if it has not been read to the end.
pub struct HttpRowCursor<'conn> {
    response: Option<reqwest::Response>,
    lines: LineBuffer,
    columns: Vec<ColumnDescriptor>,
    rows_read: usize,
    _conn: PhantomData<&'conn Connection>,
}

impl<'conn> HttpRowCursor<'conn> {
    /// Wrap a successful response and read the two header lines (names, types).
    pub(crate) async fn open(
        _conn: &'conn Connection,
        response: reqwest::Response,
    ) -> DbResult<Self> {
        let mut cursor = Self {
            response: Some(response),
            lines: LineBuffer::new(MAX_RESULT_LINE_BYTES),
            columns: Vec::new(),
            rows_read: 0,
            _conn: PhantomData,
        };

        // Statements without a result set send an empty body.
        let Some(names_line) = cursor.next_line().await? else {
            return Ok(cursor);
        };
        let names = parse_header(&names_line, "column names")?;
        let types = match cursor.next_line().await? {
            Some(line) => parse_header(&line, "column types")?,
            None => return Err(DbError::iteration("result ended before column types")),
        };
        if names.len() != types.len() {
            return Err(DbError::iteration(format!(
                "result has {} column names but {} column types",
                names.len(),
                types.len()
            )));
        }

        cursor.columns = names
            .into_iter()
            .zip(types)
            .map(|(name, type_name)| ColumnDescriptor::new(name, type_name))
            .collect();

        debug!(columns = cursor.columns.len(), "Cursor opened");
        Ok(cursor)
    }

    /// Next newline-terminated line of the body, without the terminator.
    async fn next_line(&mut self) -> DbResult<Option<String>> {
        loop {
            if let Some(line) = self.lines.next_line()? {
                return utf8_line(line).map(Some);
            }

            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };

            match response.chunk().await {
                Ok(Some(chunk)) => self.lines.push(&chunk),
                Ok(None) => {
                    self.response = None;
                    return self.lines.take_rest().map(utf8_line).transpose();
                }
                Err(e) => {
                    self.response = None;
                    return Err(DbError::iteration(format!(
                        "failed to read response body: {e}"
                    )));
                }
            }
        }
    }
}

impl RowCursor for HttpRowCursor<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> DbResult<Option<RawRow>> {
        loop {
            let Some(line) = self.next_line().await? else {
                debug!(rows = self.rows_read, "Cursor exhausted");
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }

            // A server-side failure after streaming started arrives as plain text
            // in place of the next row.
            let row = match serde_json::from_str::<RawRow>(&line) {
                Ok(row) => row,
                Err(_) => return Err(DbError::iteration(line.trim().to_string())),
            };
            self.rows_read += 1;
            return Ok(Some(row));
        }
    }
}

/// Splits a chunked byte stream into lines.
///
/// Consumed lines are reclaimed lazily and the bytes already searched for a
/// newline are not searched again, so splitting stays linear in the body size.
#[derive(Debug)]
struct LineBuffer {
    bytes: Vec<u8>,
    /// Offset of the first unread byte.
    start: usize,
    /// `bytes[start..scanned]` contains no newline.
    scanned: usize,
    max_line_bytes: usize,
}

impl LineBuffer {
    fn new(max_line_bytes: usize) -> Self {
        Self {
            bytes: Vec::new(),
            start: 0,
            scanned: 0,
            max_line_bytes,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        if self.start > 0 && self.start >= self.bytes.len() / 2 {
            self.bytes.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line without its `\n` or `\r\n` terminator.
    fn next_line(&mut self) -> DbResult<Option<Vec<u8>>> {
        let Some(offset) = self.bytes[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = self.bytes.len();
            self.check_len(self.bytes.len() - self.start)?;
            return Ok(None);
        };

        let end = self.scanned + offset;
        self.check_len(end - self.start)?;
        let mut line = self.bytes[self.start..end].to_vec();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        self.start = end + 1;
        self.scanned = self.start;
        Ok(Some(line))
    }

    /// Unterminated bytes left once the stream has ended.
    fn take_rest(&mut self) -> Option<Vec<u8>> {
        let rest = (self.start < self.bytes.len()).then(|| self.bytes[self.start..].to_vec());
        self.bytes.clear();
        self.start = 0;
        self.scanned = 0;
        rest
    }

    fn check_len(&self, len: usize) -> DbResult<()> {
        if len > self.max_line_bytes {
            return Err(DbError::iteration(format!(
                "result line too large (limit {} bytes, received {len} bytes)",
                self.max_line_bytes
            )));
        }
        Ok(())
    }
}

fn utf8_line(bytes: Vec<u8>) -> DbResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| DbError::iteration(format!("response is not valid UTF-8: {e}")))
}

fn parse_header(line: &str, what: &str) -> DbResult<Vec<String>> {
    serde_json::from_str(line).map_err(|_| {
        let line = line.trim();
        if line.is_empty() {
            DbError::iteration(format!("missing {what}"))
        } else {
            DbError::iteration(format!("unexpected {what} line: {line}"))
        }
    })
}

/// Cursor over rows already held in memory.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<DbResult<RawRow>>,
}

impl MemoryCursor {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows: rows.into_iter().map(Ok).collect(),
        }
    }

    /// Append a failure that is reported after the rows queued so far.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.rows.push_back(Err(DbError::iteration(message)));
        self
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> DbResult<Option<RawRow>> {
        self.rows.pop_front().transpose()
    }
}
