//! Row store statements
//!
//! Builder-style statements returned by [`RowStore`](super::RowStore)
//! methods. Nothing touches the network until `execute()`.
//!
//! Update and delete are resolve-then-mutate: `execute` first queries the
//! identity column for every matching row, then batch-mutates those rows
//! by position. Two concurrent writers race with no detection — the last
//! physical write wins.

use tracing::debug;

use crate::a1::{A1Range, CellSelector};
use crate::error::{GridError, Result};
use crate::formula;
use crate::transport::{BatchUpdateRequest, Cell, InsertMode, SheetTransport};

use super::query::{Order, QueryArg, QueryBuilder};
use super::schema::{FieldType, FieldValue, Record, RID_COLUMN_NAME};
use super::store::RowStore;

/// Wrap a user predicate so header/blank rows never match: the identity
/// column is only set on real data rows.
fn and_default_clause(condition: &str) -> String {
    format!("{} IS NOT NULL AND ({})", RID_COLUMN_NAME, condition)
}

/// Resolve the identity-column values of every row matched by `query`.
fn matching_rids<T: SheetTransport>(store: &RowStore<T>, query: &QueryBuilder) -> Result<Vec<u64>> {
    let select = query.build_select(&[RID_COLUMN_NAME.to_string()])?;
    let rows = store.transport().query(
        store.spreadsheet_id(),
        store.sheet_name(),
        &select,
        true,
    )?;

    rows.iter()
        .map(|row| match row.first() {
            Some(Cell::Int(v)) if *v > 0 => Ok(*v as u64),
            other => Err(GridError::Transport(format!(
                "identity column held {:?} instead of a row number",
                other
            ))),
        })
        .collect()
}

// =============================================================================
// Select
// =============================================================================

/// A select statement; executes to typed [`Record`]s.
pub struct SelectStmt<'a, T: SheetTransport> {
    store: &'a RowStore<T>,
    columns: Vec<String>,
    query: QueryBuilder,
}

impl<'a, T: SheetTransport> SelectStmt<'a, T> {
    pub(crate) fn new(store: &'a RowStore<T>, columns: Vec<String>) -> Self {
        Self {
            store,
            columns,
            query: store.new_query(),
        }
    }

    /// Filter the rows to return. `condition` may contain `?`
    /// placeholders filled positionally from `args`.
    pub fn where_clause(mut self, condition: &str, args: Vec<QueryArg>) -> Result<Self> {
        self.query = self.query.where_clause(&and_default_clause(condition), args)?;
        Ok(self)
    }

    pub fn order_by(mut self, field: &str, order: Order) -> Result<Self> {
        self.query = self.query.order_by(field, order)?;
        Ok(self)
    }

    pub fn limit(mut self, limit: i64) -> Result<Self> {
        self.query = self.query.limit(limit)?;
        Ok(self)
    }

    pub fn offset(mut self, offset: i64) -> Result<Self> {
        self.query = self.query.offset(offset)?;
        Ok(self)
    }

    /// Run the query and deserialize each returned row into a [`Record`].
    ///
    /// Fields outside the selected columns stay unset on the returned
    /// records.
    pub fn execute(self) -> Result<Vec<Record>> {
        let select = self.query.build_select(&self.columns)?;
        let rows = self.store.transport().query(
            self.store.spreadsheet_id(),
            self.store.sheet_name(),
            &select,
            true,
        )?;

        let schema = self.store.schema();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut record = Record::new(schema);

            for (idx, column) in self.columns.iter().enumerate() {
                let cell = row.get(idx).unwrap_or(&Cell::Null);

                if column == RID_COLUMN_NAME {
                    if let Cell::Int(v) = cell {
                        if *v > 0 {
                            record.set_rid(*v as u64);
                        }
                    }
                    continue;
                }

                let field_idx = schema.field_index(column).ok_or_else(|| {
                    GridError::Schema(format!("unknown field {}", column))
                })?;
                let field = &schema.fields()[field_idx];
                record.set_raw(field_idx, field_value_from_cell(cell, field.field_type())?);
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// Decode one query cell into the declared field type. Integer cells
/// widen into float fields; anything else mismatched is foreign data.
///
/// An empty cell reads back as unset: the wire stores unset and
/// explicitly-null fields identically, so the write-side distinction
/// does not survive the round trip.
fn field_value_from_cell(cell: &Cell, field_type: FieldType) -> Result<FieldValue> {
    let value = match (field_type, cell) {
        (_, Cell::Null) => FieldValue::Unset,
        (FieldType::Integer, Cell::Int(v)) => FieldValue::Int(*v),
        (FieldType::Float, Cell::Int(v)) => FieldValue::Float(*v as f64),
        (FieldType::Float, Cell::Float(v)) => FieldValue::Float(*v),
        (FieldType::Bool, Cell::Bool(v)) => FieldValue::Bool(*v),
        (FieldType::String, Cell::Text(v)) => FieldValue::Text(v.clone()),
        (expected, got) => {
            return Err(GridError::Decode(format!(
                "cell {:?} does not fit a {} field",
                got, expected
            )));
        }
    };

    Ok(value)
}

// =============================================================================
// Insert
// =============================================================================

/// An insert statement over caller-owned records.
pub struct InsertStmt<'a, 'r, T: SheetTransport> {
    store: &'a RowStore<T>,
    rows: &'r mut [Record],
}

impl<'a, 'r, T: SheetTransport> InsertStmt<'a, 'r, T> {
    pub(crate) fn new(store: &'a RowStore<T>, rows: &'r mut [Record]) -> Self {
        Self { store, rows }
    }

    /// Append all rows in one call and write the assigned row number back
    /// onto each record's identity field.
    ///
    /// The first cell of every appended row is a row-number formula the
    /// service evaluates at write time; the echoed result is the only way
    /// the store learns each new row's identity.
    pub fn execute(self) -> Result<()> {
        let schema = self.store.schema();
        let mut values = Vec::with_capacity(self.rows.len());

        for record in self.rows.iter() {
            if record.schema() != schema {
                return Err(GridError::Schema(
                    "record was built from a different schema".to_string(),
                ));
            }

            let mut raw = Vec::with_capacity(schema.len() + 1);
            raw.push(formula::CURRENT_ROW.to_string());
            raw.extend(record.values().iter().map(FieldValue::to_cell_string));
            values.push(raw);
        }

        let result = self.store.transport().append(
            self.store.spreadsheet_id(),
            &A1Range::from_sheet(self.store.sheet_name()),
            &values,
            InsertMode::Overwrite,
        )?;

        for (record, row) in self.rows.iter_mut().zip(result.values.iter()) {
            let rid = row
                .first()
                .and_then(|cell| cell.parse::<u64>().ok())
                .ok_or_else(|| {
                    GridError::Transport("insert did not echo a row number".to_string())
                })?;
            record.set_rid(rid);
        }

        debug!(rows = self.rows.len(), "rows inserted");
        Ok(())
    }
}

// =============================================================================
// Update
// =============================================================================

/// An update statement; executes to the number of matched rows.
pub struct UpdateStmt<'a, T: SheetTransport> {
    store: &'a RowStore<T>,
    /// `(field index, new value)` pairs, identity already stripped.
    changes: Vec<(usize, FieldValue)>,
    query: QueryBuilder,
}

impl<'a, T: SheetTransport> UpdateStmt<'a, T> {
    pub(crate) fn new(store: &'a RowStore<T>, changes: Vec<(usize, FieldValue)>) -> Self {
        Self {
            store,
            changes,
            query: store.new_query(),
        }
    }

    /// Filter the rows to update; with no predicate, every row with a set
    /// identity matches.
    pub fn where_clause(mut self, condition: &str, args: Vec<QueryArg>) -> Result<Self> {
        self.query = self.query.where_clause(&and_default_clause(condition), args)?;
        Ok(self)
    }

    /// Resolve the matching rows, then apply one single-cell update per
    /// (matched row × changed field) in one batched round trip.
    pub fn execute(self) -> Result<u64> {
        let rids = matching_rids(self.store, &self.query)?;

        let mut requests = Vec::with_capacity(rids.len() * self.changes.len());
        for rid in &rids {
            for (field_idx, value) in &self.changes {
                // Column 1 is the identity; declared fields start at 2.
                let selector = CellSelector::from_rc(*field_idx as u32 + 2, *rid as u32);
                requests.push(BatchUpdateRequest {
                    range: A1Range::cell(self.store.sheet_name(), selector),
                    values: vec![vec![value.to_cell_string()]],
                });
            }
        }

        if !requests.is_empty() {
            self.store
                .transport()
                .batch_update(self.store.spreadsheet_id(), &requests)?;
        }

        debug!(matched = rids.len(), "rows updated");
        Ok(rids.len() as u64)
    }
}

// =============================================================================
// Delete
// =============================================================================

/// A delete statement; executes to the number of deleted rows.
pub struct DeleteStmt<'a, T: SheetTransport> {
    store: &'a RowStore<T>,
    query: QueryBuilder,
}

impl<'a, T: SheetTransport> DeleteStmt<'a, T> {
    pub(crate) fn new(store: &'a RowStore<T>) -> Self {
        Self {
            store,
            query: store.new_query(),
        }
    }

    /// Filter the rows to delete; with no predicate, every row with a set
    /// identity matches.
    pub fn where_clause(mut self, condition: &str, args: Vec<QueryArg>) -> Result<Self> {
        self.query = self.query.where_clause(&and_default_clause(condition), args)?;
        Ok(self)
    }

    /// Resolve the matching rows, then clear each one's full row range in
    /// a single call.
    pub fn execute(self) -> Result<u64> {
        let rids = matching_rids(self.store, &self.query)?;

        let ranges: Vec<A1Range> = rids
            .iter()
            .map(|rid| A1Range::whole_row(self.store.sheet_name(), *rid as u32))
            .collect();

        if !ranges.is_empty() {
            self.store
                .transport()
                .clear(self.store.spreadsheet_id(), &ranges)?;
        }

        debug!(matched = rids.len(), "rows deleted");
        Ok(rids.len() as u64)
    }
}

// =============================================================================
// Count
// =============================================================================

/// A count statement; executes to the number of matching rows.
pub struct CountStmt<'a, T: SheetTransport> {
    store: &'a RowStore<T>,
    query: QueryBuilder,
}

impl<'a, T: SheetTransport> CountStmt<'a, T> {
    pub(crate) fn new(store: &'a RowStore<T>) -> Self {
        Self {
            store,
            query: store.new_query(),
        }
    }

    /// Filter the rows to count.
    pub fn where_clause(mut self, condition: &str, args: Vec<QueryArg>) -> Result<Self> {
        self.query = self.query.where_clause(&and_default_clause(condition), args)?;
        Ok(self)
    }

    /// Run a `COUNT` aggregate over the identity column.
    ///
    /// An empty sheet returns no result rows at all rather than a row
    /// containing zero; that shape is a count of 0, not an error.
    pub fn execute(self) -> Result<u64> {
        let column = format!("COUNT({})", RID_COLUMN_NAME);
        let select = self.query.build_select(&[column])?;
        let rows = self.store.transport().query(
            self.store.spreadsheet_id(),
            self.store.sheet_name(),
            &select,
            true,
        )?;

        match rows.first().and_then(|row| row.first()) {
            None | Some(Cell::Null) => Ok(0),
            Some(Cell::Int(v)) if *v >= 0 => Ok(*v as u64),
            Some(other) => Err(GridError::Transport(format!(
                "count aggregate returned {:?}",
                other
            ))),
        }
    }
}
