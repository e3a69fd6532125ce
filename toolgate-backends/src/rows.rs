// toolgate-backends/src/rows.rs
// ============================================================================
// Module: Row Normalization
// Description: Shared result shaping for SQL-backed tools.
// Purpose: Normalize driver rows into JSON and apply the empty sentinels.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! SQL-shaped tools return a sequence of row maps keyed by the driver's
//! reported column labels. Null column values stay JSON null, and byte
//! columns for textual types are decoded as UTF-8 strings. A statement that
//! produces no result set (DDL, INSERT) and a query that matches zero rows
//! both surface a sentinel string rather than an empty array, so a
//! model-driven caller can tell the two situations apart.

use serde_json::Map;
use serde_json::Value;

/// Sentinel for a row-producing query that matched nothing.
pub const NO_ROWS_MESSAGE: &str = "The query returned 0 rows.";

/// Sentinel for a successful statement with no result set.
pub const NO_CONTENT_MESSAGE: &str = "Query executed successfully and returned no content.";

/// Shapes a collected result set into the invoke result value.
///
/// `produces_rows` reflects whether the statement declared result columns;
/// it distinguishes an empty SELECT from DDL.
#[must_use]
pub fn rows_result(rows: Vec<Map<String, Value>>, produces_rows: bool) -> Value {
    if !produces_rows {
        return Value::String(NO_CONTENT_MESSAGE.to_string());
    }
    if rows.is_empty() {
        return Value::String(NO_ROWS_MESSAGE.to_string());
    }
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// Decodes a byte column as UTF-8 text.
///
/// Drivers that report textual types as byte slices must convert before
/// serialization; lossy decoding keeps invalid sequences visible instead of
/// failing the whole row.
#[must_use]
pub fn bytes_to_text(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}
