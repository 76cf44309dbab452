//! Formula templates
//!
//! Pure string builders for the spreadsheet formulas the engines write
//! into the scratchpad cell. The formula language is an opaque DSL that
//! this crate only ever emits; the single evaluated scalar is read back
//! from the update result.

use crate::a1::A1Range;

/// The formula the row-store insert protocol seeds each new row with:
/// evaluates to the row's own physical row number at write time.
pub(crate) const CURRENT_ROW: &str = "=ROW()";

/// Escape a value for use inside a double-quoted formula string literal.
///
/// Double quotes are escaped by doubling inside the formula language.
fn escape_literal(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// Exact-match lookup of `key` in the first column of `table`, returning
/// the value from 1-based `value_col`.
///
/// `=VLOOKUP("key", Sheet!A:B, 2, FALSE)`
pub(crate) fn vlookup(key: &str, table: &A1Range, value_col: u32) -> String {
    format!(
        "=VLOOKUP(\"{}\", {}, {}, FALSE)",
        escape_literal(key),
        table,
        value_col
    )
}

/// Exact-match lookup against `table` logically sorted by `sort_col`
/// descending, so the most recent write for a key wins even though older
/// rows remain physically present.
///
/// `=VLOOKUP("key", SORT(Sheet!A:C, 3, FALSE), 2, FALSE)`
pub(crate) fn vlookup_latest(key: &str, table: &A1Range, value_col: u32, sort_col: u32) -> String {
    format!(
        "=VLOOKUP(\"{}\", SORT({}, {}, FALSE), {}, FALSE)",
        escape_literal(key),
        table,
        sort_col,
        value_col
    )
}

/// Exact-match position of `key` within the one-dimensional `range`,
/// 1-based.
///
/// `=MATCH("key", Sheet!A:A, 0)`
pub(crate) fn match_row(key: &str, range: &A1Range) -> String {
    format!("=MATCH(\"{}\", {}, 0)", escape_literal(key), range)
}
