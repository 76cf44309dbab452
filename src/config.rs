//! Configuration for gridstore stores
//!
//! Small immutable configuration values handed to the stores at
//! construction time.

use crate::row::Schema;

/// Storage strategy of the key-value store, selected at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KvMode {
    /// Point-update table: a key maps to at most one physical row,
    /// overwritten in place.
    #[default]
    Default,

    /// Append-only log: every write appends a row; the row with the
    /// greatest timestamp is authoritative and a tombstone is a later
    /// row carrying an empty value.
    AppendOnly,
}

/// Configuration for a [`KvStore`](crate::KvStore) instance.
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// The spreadsheet the store operates in.
    pub spreadsheet_id: String,

    /// The data sheet; the companion scratch sheet is derived from it.
    pub sheet_name: String,

    /// Storage strategy.
    pub mode: KvMode,
}

impl KvConfig {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            mode: KvMode::Default,
        }
    }

    /// Select the storage strategy.
    pub fn mode(mut self, mode: KvMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Configuration for a [`RowStore`](crate::RowStore) instance.
#[derive(Debug, Clone)]
pub struct RowConfig {
    /// The spreadsheet the store operates in.
    pub spreadsheet_id: String,

    /// The data sheet; row 1 holds the column headers.
    pub sheet_name: String,

    /// The declared field layout; declaration order is column order.
    pub schema: Schema,
}

impl RowConfig {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        schema: Schema,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            schema,
        }
    }
}
