//! Sheet Transport
//!
//! The boundary between the store engines and the backing spreadsheet
//! service: range-addressed append/update/clear plus a post-processed
//! tabular query. The engines only ever talk to [`SheetTransport`]; the
//! concrete Google implementation lives in [`google`].
//!
//! ## Contract
//! - `append` with [`InsertMode::Insert`] grows the sheet below existing
//!   data; with [`InsertMode::Overwrite`] it writes over the destination
//!   in place.
//! - Every mutation result carries the range the service actually wrote,
//!   which may differ from the requested range. Future lookups must use
//!   the result's range and values, not the request's.
//! - No operation is retried; failures surface as
//!   [`GridError::Transport`](crate::GridError::Transport) immediately.

pub mod google;

use crate::a1::A1Range;
use crate::error::Result;

/// How `append` places the written rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Insert new rows below existing data, growing the sheet.
    Insert,

    /// Overwrite the destination location in place.
    Overwrite,
}

/// Result of a mutation (append/update), produced fresh per call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationResult {
    /// The range the service actually wrote (server-assigned; may differ
    /// from the requested range).
    pub updated_range: A1Range,
    pub updated_rows: u32,
    pub updated_columns: u32,
    pub updated_cells: u32,
    /// The resulting cell values as the service rendered them, with any
    /// formulas already evaluated.
    pub values: Vec<Vec<String>>,
}

/// One independent range update inside a `batch_update` call.
#[derive(Debug, Clone)]
pub struct BatchUpdateRequest {
    pub range: A1Range,
    pub values: Vec<Vec<String>>,
}

/// A typed cell from the tabular query endpoint.
///
/// Numbers keep the integer/float split the backing engine reports;
/// date/datetime/timeofday columns surface their formatted string, not a
/// parsed temporal type. A cell with no value is `Null` — positions are
/// preserved across a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// Best-effort idempotent sheet creation used at store construction:
/// "already exists" and any other creation failure are treated identically
/// as "proceed anyway". This is the only call site in the crate where a
/// failure is swallowed.
pub(crate) fn ensure_sheet<T: SheetTransport + ?Sized>(
    transport: &T,
    spreadsheet_id: &str,
    sheet_name: &str,
) {
    if let Err(err) = transport.create_sheet(spreadsheet_id, sheet_name) {
        tracing::debug!(sheet = %sheet_name, %err, "sheet creation skipped");
    }
}

/// The operations the store engines need from the backing service.
///
/// Object-safe so stores can also hold boxed transports; all methods take
/// `&self` — the transport itself is stateless between calls.
pub trait SheetTransport {
    /// Create a sheet with the given name inside the spreadsheet.
    ///
    /// Creation is not idempotent at this level: creating an existing
    /// sheet fails. The stores treat that failure as best-effort at
    /// construction time and swallow it there.
    fn create_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()>;

    /// Append rows at `range` according to `mode`.
    fn append(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
        mode: InsertMode,
    ) -> Result<MutationResult>;

    /// Write rows starting exactly at `range`; the shape of `values`
    /// implicitly sizes the affected range.
    fn update(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
    ) -> Result<MutationResult>;

    /// Apply many independent range updates in one round trip.
    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: &[BatchUpdateRequest],
    ) -> Result<Vec<MutationResult>>;

    /// Erase the contents (not formatting) of one or more ranges in one
    /// call.
    fn clear(&self, spreadsheet_id: &str, ranges: &[A1Range]) -> Result<()>;

    /// Execute a read-only tabular query (restricted SQL subset) against
    /// the sheet's data and return typed cells.
    ///
    /// Row order is whatever the backing engine chose unless the query
    /// carries an ORDER BY; callers must not assume source order.
    fn query(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        has_header: bool,
    ) -> Result<Vec<Vec<Cell>>>;
}
