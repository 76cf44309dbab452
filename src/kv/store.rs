//! Key-value store implementation
//!
//! ## Concurrency Model
//!
//! Single-threaded, synchronous, blocking: every operation is one or more
//! blocking round trips to the transport. Default-mode `set` is a
//! resolve-then-mutate sequence with no cross-operation locking, so
//! concurrent writers to the same key race and the last physical write
//! wins. Callers needing concurrency run multiple store instances, each
//! with its own scratchpad cell.
//!
//! Operations take `&mut self`: the exclusive borrow guarantees the
//! scratchpad cell is used by at most one logical operation at a time
//! within an instance.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::a1::{A1Range, CellSelector};
use crate::codec::{Codec, PrefixCodec};
use crate::config::{KvConfig, KvMode};
use crate::error::{GridError, Result};
use crate::formula;
use crate::scratchpad::{scratch_sheet_name, Scratchpad};
use crate::transport::{ensure_sheet, InsertMode, SheetTransport};

/// The spreadsheet engine's own "value not found" marker.
const NA_VALUE: &str = "#N/A";

/// 1-based data columns of the store's sheet.
const KEY_COL: u32 = 1;
const VALUE_COL: u32 = 2;
const TS_COL: u32 = 3;

/// A key-value store bound to one sheet of one spreadsheet.
///
/// State machine per instance: `Open → Closed` (terminal). Every
/// operation is valid only while open; after [`KvStore::close`] all
/// calls fail with [`GridError::InvalidOperation`].
pub struct KvStore<T: SheetTransport> {
    transport: T,
    spreadsheet_id: String,
    sheet_name: String,
    mode: KvMode,
    codec: Box<dyn Codec>,
    scratchpad: Scratchpad,
    closed: bool,
}

impl<T: SheetTransport> KvStore<T> {
    /// Open a store with the default prefix codec.
    ///
    /// Construction creates the data and scratch sheets if missing
    /// (best-effort: creation failures, including "already exists", are
    /// swallowed here and nowhere else) and books the scratchpad cell.
    pub fn open(transport: T, config: KvConfig) -> Result<Self> {
        Self::open_with_codec(transport, config, Box::new(PrefixCodec::default()))
    }

    /// Open a store with a caller-supplied codec.
    pub fn open_with_codec(
        transport: T,
        config: KvConfig,
        codec: Box<dyn Codec>,
    ) -> Result<Self> {
        let KvConfig {
            spreadsheet_id,
            sheet_name,
            mode,
        } = config;
        let scratch_name = scratch_sheet_name(&sheet_name);

        ensure_sheet(&transport, &spreadsheet_id, &sheet_name);
        ensure_sheet(&transport, &spreadsheet_id, &scratch_name);

        let scratchpad = Scratchpad::book(&transport, &spreadsheet_id, &scratch_name)?;

        Ok(Self {
            transport,
            spreadsheet_id,
            sheet_name,
            mode,
            codec,
            scratchpad,
            closed: false,
        })
    }

    /// Get the value associated with `key`.
    ///
    /// Fails with [`GridError::KeyNotFound`] when no live entry exists —
    /// including when the newest append-only entry is a tombstone.
    pub fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.ensure_open()?;

        let formula = self.lookup_formula(key);
        let value = self
            .scratchpad
            .eval(&self.transport, &self.spreadsheet_id, &formula)?;
        let value = ensure_value(value)?;

        self.codec.decode(&value)
    }

    /// Set the value associated with `key`.
    pub fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.ensure_open()?;

        let encoded = self.codec.encode(value)?;
        let ts = now_millis();

        match self.mode {
            KvMode::Default => self.default_set(key, &encoded, ts),
            KvMode::AppendOnly => self.append_row(key, &encoded, ts),
        }
    }

    /// Delete the entry associated with `key`.
    ///
    /// Default mode resolves the key's row and clears it, so the key
    /// disappears from scans; a missing key is a no-op. Append-only mode
    /// appends a tombstone row with an empty value.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.ensure_open()?;

        match self.mode {
            KvMode::Default => match self.find_key_row(key) {
                Ok(row) => self
                    .transport
                    .clear(&self.spreadsheet_id, std::slice::from_ref(&row)),
                Err(GridError::KeyNotFound) => Ok(()),
                Err(err) => Err(err),
            },
            KvMode::AppendOnly => self.append_row(key, "", now_millis()),
        }
    }

    /// Release the scratchpad cell and mark the instance closed.
    ///
    /// Any further operation, including a second `close`, fails with
    /// [`GridError::InvalidOperation`].
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.scratchpad
            .release(&self.transport, &self.spreadsheet_id)?;
        self.closed = true;
        debug!(sheet = %self.sheet_name, "kv store closed");
        Ok(())
    }

    /// The scratchpad cell booked by this instance.
    pub fn scratchpad_cell(&self) -> &A1Range {
        self.scratchpad.cell()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(GridError::InvalidOperation);
        }
        Ok(())
    }

    fn lookup_formula(&self, key: &str) -> String {
        match self.mode {
            KvMode::Default => {
                let table = self.column_span(KEY_COL, VALUE_COL);
                formula::vlookup(key, &table, VALUE_COL)
            }
            KvMode::AppendOnly => {
                // Logically sort the whole log newest-first so the most
                // recent write for the key is the one VLOOKUP sees.
                let table = self.column_span(KEY_COL, TS_COL);
                formula::vlookup_latest(key, &table, VALUE_COL, TS_COL)
            }
        }
    }

    /// `Sheet!A:C`-style whole-column span over the data table.
    fn column_span(&self, from: u32, to: u32) -> A1Range {
        A1Range::bounded(
            &self.sheet_name,
            CellSelector::whole_column(from),
            CellSelector::whole_column(to),
        )
    }

    fn default_set(&self, key: &str, encoded: &str, ts: u64) -> Result<()> {
        match self.find_key_row(key) {
            Ok(row) => {
                self.transport
                    .update(&self.spreadsheet_id, &row, &[entry_row(key, encoded, ts)])?;
                Ok(())
            }
            Err(GridError::KeyNotFound) => self.append_row(key, encoded, ts),
            Err(err) => Err(err),
        }
    }

    /// Resolve the physical row currently holding `key`.
    fn find_key_row(&self, key: &str) -> Result<A1Range> {
        let key_column = self.column_span(KEY_COL, KEY_COL);
        let formula = formula::match_row(key, &key_column);

        let value = self
            .scratchpad
            .eval(&self.transport, &self.spreadsheet_id, &formula)?;
        let row_idx: u32 = ensure_value(value)?
            .parse()
            .map_err(|_| GridError::Transport("match result is not a row number".to_string()))?;

        Ok(A1Range::whole_row(&self.sheet_name, row_idx))
    }

    fn append_row(&self, key: &str, encoded: &str, ts: u64) -> Result<()> {
        let mode = match self.mode {
            KvMode::Default => InsertMode::Overwrite,
            KvMode::AppendOnly => InsertMode::Insert,
        };

        self.transport.append(
            &self.spreadsheet_id,
            &A1Range::from_sheet(&self.sheet_name),
            &[entry_row(key, encoded, ts)],
            mode,
        )?;
        Ok(())
    }
}

fn entry_row(key: &str, encoded: &str, ts: u64) -> Vec<String> {
    vec![key.to_string(), encoded.to_string(), ts.to_string()]
}

/// Reject the "no value" shapes: nothing echoed, an empty cell, or the
/// engine's missing-value marker. The empty-cell case doubles as the
/// append-only tombstone check.
fn ensure_value(value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() && v != NA_VALUE => Ok(v),
        _ => Err(GridError::KeyNotFound),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
