//! ClickHouse type mappings.
//!
//! Result rows arrive as JSON arrays, one cell per column. The engine type tag
//! of each column selects how its cells are decoded:
//! 1. `ColumnType` classifies the tag into a closed set of supported wire types
//! 2. `decode_cell` turns one JSON cell into a typed `CellValue`
//!
//! `CellValue` implements `Display` with the printable form used in rendered tables.

use crate::error::{DbError, DbResult};
use crate::models::ColumnDescriptor;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use std::fmt;

// =============================================================================
// Type Classification
// =============================================================================

/// Supported ClickHouse wire types. Anything else decodes as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// `String` and `FixedString(N)`
    String,
    /// `Date` and `Date32`
    Date,
    /// `DateTime` with optional timezone argument
    DateTime,
    /// `DateTime64(precision[, timezone])`
    DateTime64,
    Other,
}

impl ColumnType {
    /// Classify an engine type tag.
    ///
    /// `Nullable(T)` and `LowCardinality(T)` classify as `T`; nullability is
    /// handled per cell.
    pub fn parse(type_name: &str) -> Self {
        let inner = unwrap_modifiers(type_name.trim());
        let base = inner.split('(').next().unwrap_or(inner).trim();

        match base {
            "UInt8" => Self::UInt8,
            "UInt16" => Self::UInt16,
            "UInt32" => Self::UInt32,
            "UInt64" => Self::UInt64,
            "Int8" => Self::Int8,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            "String" | "FixedString" => Self::String,
            "Date" | "Date32" => Self::Date,
            "DateTime" => Self::DateTime,
            "DateTime64" => Self::DateTime64,
            _ => Self::Other,
        }
    }
}

/// Strip `Nullable(...)` / `LowCardinality(...)` wrappers, in any nesting order.
fn unwrap_modifiers(mut type_name: &str) -> &str {
    loop {
        let stripped = ["Nullable(", "LowCardinality("].iter().find_map(|prefix| {
            type_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
        });
        match stripped {
            Some(inner) => type_name = inner.trim(),
            None => return type_name,
        }
    }
}

// =============================================================================
// Decoded Values
// =============================================================================

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    DateTime(NaiveDateTime),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => f.write_str(&format_float32(*v)),
            Self::Float64(v) => f.write_str(&format_float64(*v)),
            Self::String(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// =============================================================================
// Float Formatting
// =============================================================================

/// Shortest round-trip digits, switching to exponent form when the decimal
/// exponent is below -4 or at least 6 (`%g` style: `1.234567e+06`, `1e-05`).
pub fn format_float64(value: f64) -> String {
    if let Some(special) = non_finite(value.is_nan(), value.is_infinite(), value < 0.0) {
        return special.to_string();
    }
    general_format(format!("{value}"), format!("{value:e}"))
}

/// Same as [`format_float64`] using the shortest digits of the 32-bit value.
pub fn format_float32(value: f32) -> String {
    if let Some(special) = non_finite(value.is_nan(), value.is_infinite(), value < 0.0) {
        return special.to_string();
    }
    general_format(format!("{value}"), format!("{value:e}"))
}

fn non_finite(is_nan: bool, is_infinite: bool, negative: bool) -> Option<&'static str> {
    if is_nan {
        Some("NaN")
    } else if is_infinite {
        Some(if negative { "-Inf" } else { "+Inf" })
    } else {
        None
    }
}

/// `plain` and `scientific` are the `{}` and `{:e}` renderings of the same value.
fn general_format(plain: String, scientific: String) -> String {
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return plain;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return plain;
    };

    if (-4..6).contains(&exponent) {
        plain
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

// =============================================================================
// Cell Decoding
// =============================================================================

/// Decode one JSON cell according to its column type.
///
/// A JSON `null` decodes to `CellValue::Null` for every column type.
pub fn decode_cell(column_type: ColumnType, cell: &JsonValue) -> Result<CellValue, String> {
    if cell.is_null() {
        return Ok(CellValue::Null);
    }

    let value = match column_type {
        ColumnType::UInt8 => CellValue::UInt8(narrow(unsigned(cell)?, "UInt8")?),
        ColumnType::UInt16 => CellValue::UInt16(narrow(unsigned(cell)?, "UInt16")?),
        ColumnType::UInt32 => CellValue::UInt32(narrow(unsigned(cell)?, "UInt32")?),
        ColumnType::UInt64 => CellValue::UInt64(unsigned(cell)?),
        ColumnType::Int8 => CellValue::Int8(narrow(signed(cell)?, "Int8")?),
        ColumnType::Int16 => CellValue::Int16(narrow(signed(cell)?, "Int16")?),
        ColumnType::Int32 => CellValue::Int32(narrow(signed(cell)?, "Int32")?),
        ColumnType::Int64 => CellValue::Int64(signed(cell)?),
        ColumnType::Float32 => CellValue::Float32(float(cell)? as f32),
        ColumnType::Float64 => CellValue::Float64(float(cell)?),
        ColumnType::Date | ColumnType::DateTime | ColumnType::DateTime64 => {
            CellValue::DateTime(temporal(cell)?)
        }
        ColumnType::String | ColumnType::Other => CellValue::String(text(cell)),
    };
    Ok(value)
}

fn unsigned(cell: &JsonValue) -> Result<u64, String> {
    match cell {
        JsonValue::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("expected unsigned integer, got {n}")),
        // 64-bit integers are quoted by default
        JsonValue::String(s) => s
            .parse()
            .map_err(|e| format!("expected unsigned integer, got {s:?}: {e}")),
        other => Err(format!("expected unsigned integer, got {other}")),
    }
}

fn signed(cell: &JsonValue) -> Result<i64, String> {
    match cell {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("expected integer, got {n}")),
        JsonValue::String(s) => s
            .parse()
            .map_err(|e| format!("expected integer, got {s:?}: {e}")),
        other => Err(format!("expected integer, got {other}")),
    }
}

fn narrow<S, T: TryFrom<S>>(value: S, type_name: &str) -> Result<T, String>
where
    S: Copy + fmt::Display,
{
    T::try_from(value).map_err(|_| format!("value {value} out of range for {type_name}"))
}

fn float(cell: &JsonValue) -> Result<f64, String> {
    match cell {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("expected float, got {n}")),
        // nan / inf / -inf
        JsonValue::String(s) => s
            .parse()
            .map_err(|e| format!("expected float, got {s:?}: {e}")),
        other => Err(format!("expected float, got {other}")),
    }
}

fn temporal(cell: &JsonValue) -> Result<NaiveDateTime, String> {
    match cell {
        JsonValue::String(s) => parse_temporal(s),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| format!("invalid unix timestamp {n}")),
        other => Err(format!("expected date or date-time, got {other}")),
    }
}

fn parse_temporal(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("expected date or date-time, got {s:?}"))
}

fn text(cell: &JsonValue) -> String {
    match cell {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Decodes whole rows using the column types fixed at cursor-open time.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    columns: Vec<(String, ColumnType)>,
}

impl RowDecoder {
    pub fn new(columns: &[ColumnDescriptor]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|c| (c.name.clone(), ColumnType::parse(&c.type_name)))
                .collect(),
        }
    }

    /// Decode one row; a cell count that differs from the column count is an error.
    pub fn decode(&self, cells: &[JsonValue]) -> DbResult<Vec<CellValue>> {
        if cells.len() != self.columns.len() {
            return Err(DbError::decode(
                "*",
                format!(
                    "row has {} values but the result has {} columns",
                    cells.len(),
                    self.columns.len()
                ),
            ));
        }

        self.columns
            .iter()
            .zip(cells)
            .map(|((name, column_type), cell)| {
                decode_cell(*column_type, cell).map_err(|message| DbError::decode(name, message))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_integer_types() {
        assert_eq!(ColumnType::parse("UInt8"), ColumnType::UInt8);
        assert_eq!(ColumnType::parse("UInt16"), ColumnType::UInt16);
        assert_eq!(ColumnType::parse("UInt32"), ColumnType::UInt32);
        assert_eq!(ColumnType::parse("UInt64"), ColumnType::UInt64);
        assert_eq!(ColumnType::parse("Int8"), ColumnType::Int8);
        assert_eq!(ColumnType::parse("Int16"), ColumnType::Int16);
        assert_eq!(ColumnType::parse("Int32"), ColumnType::Int32);
        assert_eq!(ColumnType::parse("Int64"), ColumnType::Int64);
    }

    #[test]
    fn test_parse_parameterized_types() {
        assert_eq!(ColumnType::parse("FixedString(16)"), ColumnType::String);
        assert_eq!(ColumnType::parse("DateTime('UTC')"), ColumnType::DateTime);
        assert_eq!(
            ColumnType::parse("DateTime64(3, 'Europe/Berlin')"),
            ColumnType::DateTime64
        );
        assert_eq!(ColumnType::parse("Date32"), ColumnType::Date);
    }

    #[test]
    fn test_parse_unwraps_modifiers() {
        assert_eq!(ColumnType::parse("Nullable(UInt32)"), ColumnType::UInt32);
        assert_eq!(
            ColumnType::parse("LowCardinality(Nullable(String))"),
            ColumnType::String
        );
        assert_eq!(
            ColumnType::parse("Nullable(DateTime64(6))"),
            ColumnType::DateTime64
        );
    }

    #[test]
    fn test_parse_unknown_falls_back_to_other() {
        assert_eq!(ColumnType::parse("Decimal(10, 2)"), ColumnType::Other);
        assert_eq!(ColumnType::parse("Array(UInt8)"), ColumnType::Other);
        assert_eq!(ColumnType::parse("UUID"), ColumnType::Other);
        assert_eq!(ColumnType::parse(""), ColumnType::Other);
    }

    #[test]
    fn test_null_renders_as_null_for_every_type() {
        for type_name in ["UInt8", "Int64", "Float64", "String", "DateTime", "UUID"] {
            let value = decode_cell(ColumnType::parse(type_name), &JsonValue::Null).unwrap();
            assert_eq!(value, CellValue::Null);
            assert_eq!(value.to_string(), "NULL");
        }
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(
            decode_cell(ColumnType::UInt8, &json!(255)).unwrap(),
            CellValue::UInt8(255)
        );
        assert_eq!(
            decode_cell(ColumnType::Int16, &json!(-300)).unwrap(),
            CellValue::Int16(-300)
        );
        assert_eq!(
            decode_cell(ColumnType::UInt64, &json!("18446744073709551615"))
                .unwrap()
                .to_string(),
            "18446744073709551615"
        );
        assert_eq!(
            decode_cell(ColumnType::Int64, &json!("-9223372036854775808"))
                .unwrap()
                .to_string(),
            "-9223372036854775808"
        );
    }

    #[test]
    fn test_decode_integer_out_of_range() {
        let err = decode_cell(ColumnType::UInt8, &json!(256)).unwrap_err();
        assert!(err.contains("out of range for UInt8"));

        let err = decode_cell(ColumnType::UInt32, &json!(-1)).unwrap_err();
        assert!(err.contains("unsigned"));
    }

    #[test]
    fn test_decode_integer_rejects_text() {
        assert!(decode_cell(ColumnType::Int32, &json!("abc")).is_err());
        assert!(decode_cell(ColumnType::Int32, &json!(true)).is_err());
    }

    #[test]
    fn test_float_general_format() {
        assert_eq!(format_float64(1.5), "1.5");
        assert_eq!(format_float64(100000.0), "100000");
        assert_eq!(format_float64(1234567.0), "1.234567e+06");
        assert_eq!(format_float64(0.0001), "0.0001");
        assert_eq!(format_float64(0.00001), "1e-05");
        assert_eq!(format_float64(1e300), "1e+300");
        assert_eq!(format_float64(0.0), "0");
        assert_eq!(format_float64(-2.25), "-2.25");
        assert_eq!(format_float64(f64::NAN), "NaN");
        assert_eq!(format_float64(f64::INFINITY), "+Inf");
        assert_eq!(format_float64(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_float32_uses_shortest_32_bit_digits() {
        let value = decode_cell(ColumnType::Float32, &json!(0.1)).unwrap();
        assert_eq!(value.to_string(), "0.1");
        assert_eq!(format_float32(3.25), "3.25");
    }

    #[test]
    fn test_decode_float_specials() {
        assert_eq!(
            decode_cell(ColumnType::Float64, &json!("inf"))
                .unwrap()
                .to_string(),
            "+Inf"
        );
        assert_eq!(
            decode_cell(ColumnType::Float64, &json!("nan"))
                .unwrap()
                .to_string(),
            "NaN"
        );
    }

    #[test]
    fn test_decode_temporals() {
        let dt = decode_cell(ColumnType::DateTime, &json!("2024-03-05 07:08:09")).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 07:08:09");

        let dt64 = decode_cell(ColumnType::DateTime64, &json!("2024-03-05 07:08:09.123456")).unwrap();
        assert_eq!(dt64.to_string(), "2024-03-05 07:08:09");

        let date = decode_cell(ColumnType::Date, &json!("2024-03-05")).unwrap();
        assert_eq!(date.to_string(), "2024-03-05 00:00:00");

        let ts = decode_cell(ColumnType::DateTime, &json!(0)).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_decode_temporal_rejects_garbage() {
        let err = decode_cell(ColumnType::DateTime, &json!("yesterday")).unwrap_err();
        assert!(err.contains("date"));
    }

    #[test]
    fn test_strings_pass_through_verbatim() {
        let value = decode_cell(ColumnType::String, &json!("  a | b  ")).unwrap();
        assert_eq!(value.to_string(), "  a | b  ");
    }

    #[test]
    fn test_other_types_decode_as_string() {
        assert_eq!(
            decode_cell(ColumnType::Other, &json!("12.50")).unwrap(),
            CellValue::String("12.50".to_string())
        );
        assert_eq!(
            decode_cell(ColumnType::Other, &json!([1, 2])).unwrap().to_string(),
            "[1,2]"
        );
        assert_eq!(
            decode_cell(ColumnType::Other, &json!(true)).unwrap().to_string(),
            "true"
        );
    }

    #[test]
    fn test_row_decoder_names_failing_column() {
        let decoder = RowDecoder::new(&[
            ColumnDescriptor::new("id", "UInt8"),
            ColumnDescriptor::new("name", "String"),
        ]);
        let err = decoder.decode(&[json!(1000), json!("a")]).unwrap_err();
        match err {
            DbError::Decode { column, .. } => assert_eq!(column, "id"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_row_decoder_rejects_wrong_arity() {
        let decoder = RowDecoder::new(&[ColumnDescriptor::new("id", "UInt8")]);
        assert!(matches!(
            decoder.decode(&[json!(1), json!(2)]),
            Err(DbError::Decode { .. })
        ));
    }
}
