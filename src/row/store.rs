//! Row store implementation

use tracing::debug;

use crate::a1::{col_to_letters, A1Range};
use crate::config::RowConfig;
use crate::error::{GridError, Result};
use crate::scratchpad::{scratch_sheet_name, Scratchpad};
use crate::transport::{ensure_sheet, SheetTransport};

use super::query::{ColumnMapper, QueryBuilder};
use super::schema::{check_value, FieldValue, Record, Schema, RID_COLUMN_NAME};
use super::stmt::{CountStmt, DeleteStmt, InsertStmt, SelectStmt, UpdateStmt};

/// A schema-aware tabular store bound to one sheet of one spreadsheet.
///
/// Row 1 of the data sheet holds the column headers: the identity column
/// title first, then one title per declared field in declaration order.
/// Each data row's first cell holds its own physical row number, assigned
/// by the insert protocol; that number is the row's logical primary key.
///
/// Statement-returning methods validate inputs and the open/closed state
/// up front; nothing touches the network until the statement's
/// `execute()`. While any statement borrows the store, `close()` cannot
/// be called — the borrow checker serializes lifecycle against use.
pub struct RowStore<T: SheetTransport> {
    transport: T,
    spreadsheet_id: String,
    sheet_name: String,
    schema: Schema,
    scratchpad: Scratchpad,
    closed: bool,
}

impl<T: SheetTransport> RowStore<T> {
    /// Open a store over `config.sheet_name`.
    ///
    /// Construction creates the data and scratch sheets if missing
    /// (best-effort, failures swallowed only here), writes the header
    /// row — establishing the column layout every other operation relies
    /// on — and books the scratchpad cell.
    pub fn open(transport: T, config: RowConfig) -> Result<Self> {
        let RowConfig {
            spreadsheet_id,
            sheet_name,
            schema,
        } = config;
        let scratch_name = scratch_sheet_name(&sheet_name);

        ensure_sheet(&transport, &spreadsheet_id, &sheet_name);
        ensure_sheet(&transport, &spreadsheet_id, &scratch_name);

        let mut headers = Vec::with_capacity(schema.len() + 1);
        headers.push(RID_COLUMN_NAME.to_string());
        headers.extend(schema.fields().iter().map(|f| f.title().to_string()));
        transport.update(&spreadsheet_id, &A1Range::from_sheet(&sheet_name), &[headers])?;

        let scratchpad = Scratchpad::book(&transport, &spreadsheet_id, &scratch_name)?;
        debug!(sheet = %sheet_name, fields = schema.len(), "row store opened");

        Ok(Self {
            transport,
            spreadsheet_id,
            sheet_name,
            schema,
            scratchpad,
            closed: false,
        })
    }

    /// Select `columns` (field names); with no columns, the identity plus
    /// every declared field.
    pub fn select(&self, columns: &[&str]) -> Result<SelectStmt<'_, T>> {
        self.ensure_open()?;

        let columns: Vec<String> = if columns.is_empty() {
            std::iter::once(RID_COLUMN_NAME.to_string())
                .chain(self.schema.fields().iter().map(|f| f.name().to_string()))
                .collect()
        } else {
            for column in columns {
                if *column != RID_COLUMN_NAME && self.schema.field_index(column).is_none() {
                    return Err(GridError::InvalidQuery(format!(
                        "unrecognised field {}",
                        column
                    )));
                }
            }
            columns.iter().map(|c| c.to_string()).collect()
        };

        Ok(SelectStmt::new(self, columns))
    }

    /// Insert `rows`, assigning each record's identity on success.
    pub fn insert<'r>(&self, rows: &'r mut [Record]) -> Result<InsertStmt<'_, 'r, T>> {
        self.ensure_open()?;
        Ok(InsertStmt::new(self, rows))
    }

    /// Update the given `(field, value)` pairs on every matching row.
    ///
    /// Unknown fields and type mismatches fail here, before any network
    /// call; the identity field is stripped — identity is immutable after
    /// insert.
    pub fn update(&self, values: &[(&str, FieldValue)]) -> Result<UpdateStmt<'_, T>> {
        self.ensure_open()?;

        let mut changes = Vec::with_capacity(values.len());
        for (field, value) in values {
            if *field == RID_COLUMN_NAME {
                continue;
            }

            let idx = self
                .schema
                .field_index(field)
                .ok_or_else(|| GridError::Schema(format!("{} field is not recognised", field)))?;

            if value.is_unset() {
                return Err(GridError::Schema(format!(
                    "field {}: cannot update to an unset value",
                    field
                )));
            }

            let checked = check_value(&self.schema.fields()[idx], value.clone())?;
            changes.push((idx, checked));
        }

        Ok(UpdateStmt::new(self, changes))
    }

    /// Delete every matching row.
    pub fn delete(&self) -> Result<DeleteStmt<'_, T>> {
        self.ensure_open()?;
        Ok(DeleteStmt::new(self))
    }

    /// Count matching rows with an aggregate query.
    pub fn count(&self) -> Result<CountStmt<'_, T>> {
        self.ensure_open()?;
        Ok(CountStmt::new(self))
    }

    /// Release the scratchpad cell and mark the instance closed.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.scratchpad
            .release(&self.transport, &self.spreadsheet_id)?;
        self.closed = true;
        debug!(sheet = %self.sheet_name, "row store closed");
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The scratchpad cell booked by this instance.
    pub fn scratchpad_cell(&self) -> &A1Range {
        self.scratchpad.cell()
    }

    // =========================================================================
    // Internals (shared with the statements)
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(GridError::InvalidOperation);
        }
        Ok(())
    }

    /// Field name → column letter table: identity at column A, declared
    /// fields from B on in declaration order.
    fn mapper(&self) -> ColumnMapper {
        let mut entries = Vec::with_capacity(self.schema.len() + 1);
        entries.push((RID_COLUMN_NAME.to_string(), "A".to_string()));
        for (idx, field) in self.schema.fields().iter().enumerate() {
            entries.push((field.name().to_string(), col_to_letters(idx as u32 + 2)));
        }
        ColumnMapper::new(entries)
    }

    /// A query builder seeded with the identity-not-null base predicate.
    pub(crate) fn new_query(&self) -> QueryBuilder {
        QueryBuilder::new(self.mapper())
            .base_condition(&format!("{} IS NOT NULL", RID_COLUMN_NAME))
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub(crate) fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}
