//! Scratchpad allocator
//!
//! Reserves one cell in a store's private scratch sheet to host transient
//! formulas, so a store instance reuses a single workspace cell for every
//! read-by-formula operation instead of leaking temporary cells.
//!
//! The cell is booked at store construction by overwrite-appending a
//! sentinel value and recording the range the service assigned, and is
//! cleared again on `close()`. Concurrent stores must not share one;
//! each instance books its own.

use tracing::debug;

use crate::a1::A1Range;
use crate::error::Result;
use crate::transport::{InsertMode, SheetTransport};

/// Sentinel written into the scratch sheet to claim the cell.
const BOOKED_VALUE: &str = "BOOKED";

/// Conventional name of a store's companion scratch sheet.
pub(crate) fn scratch_sheet_name(sheet_name: &str) -> String {
    format!("{}_scratch", sheet_name)
}

/// One reusable formula cell, owned exclusively by a single store
/// instance for its lifetime.
#[derive(Debug, Clone)]
pub struct Scratchpad {
    cell: A1Range,
}

impl Scratchpad {
    /// Book the cell by writing the sentinel at the scratch sheet's
    /// default location and adopting the range the service echoed back.
    pub(crate) fn book<T: SheetTransport + ?Sized>(
        transport: &T,
        spreadsheet_id: &str,
        scratch_sheet: &str,
    ) -> Result<Self> {
        let result = transport.append(
            spreadsheet_id,
            &A1Range::from_sheet(scratch_sheet),
            &[vec![BOOKED_VALUE.to_string()]],
            InsertMode::Overwrite,
        )?;

        debug!(cell = %result.updated_range, "scratchpad booked");
        Ok(Self {
            cell: result.updated_range,
        })
    }

    /// Write `formula` into the booked cell and read back the evaluated
    /// scalar from the update result.
    ///
    /// `None` means the service echoed no value at all for the cell.
    pub(crate) fn eval<T: SheetTransport + ?Sized>(
        &self,
        transport: &T,
        spreadsheet_id: &str,
        formula: &str,
    ) -> Result<Option<String>> {
        let result = transport.update(spreadsheet_id, &self.cell, &[vec![formula.to_string()]])?;

        Ok(result
            .values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next()))
    }

    /// Clear the booked cell.
    pub(crate) fn release<T: SheetTransport + ?Sized>(
        &self,
        transport: &T,
        spreadsheet_id: &str,
    ) -> Result<()> {
        debug!(cell = %self.cell, "scratchpad released");
        transport.clear(spreadsheet_id, std::slice::from_ref(&self.cell))
    }

    /// The booked cell's range.
    pub fn cell(&self) -> &A1Range {
        &self.cell
    }
}
