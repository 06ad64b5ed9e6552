//! Database abstraction layer.
//!
//! This module provides ClickHouse access functionality:
//! - Connection pool management
//! - Query execution
//! - Forward-only row cursors
//! - Type mappings

pub mod cursor;
pub mod executor;
pub mod pool;
pub mod types;

pub use cursor::{HttpRowCursor, MemoryCursor, RawRow, RowCursor};
pub use executor::{QueryExecutor, apply_row_limit};
pub use pool::{Connection, ConnectionProvider};
pub use types::{CellValue, ColumnType, RowDecoder};
