//! Shared test harness
//!
//! An in-memory [`SheetTransport`] that keeps a real cell grid per sheet
//! and honors the append/update/clear/batch-update contract, including
//! the server-assigned ranges the engines must adopt. Formula evaluation
//! covers exactly the shapes the engines emit (`=ROW()`, `=MATCH`,
//! `=VLOOKUP` with and without `SORT`); tabular query results are
//! scripted per call, and the query text is recorded for assertions.

// Each integration test binary compiles its own copy of this module and
// uses a different slice of the helpers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use gridstore::a1::{col_to_letters, letters_to_col, A1Range};
use gridstore::{
    BatchUpdateRequest, Cell, GridError, InsertMode, MutationResult, Result, SheetTransport,
};

/// Opt-in log output for a test run: `RUST_LOG=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

type Grid = Vec<Vec<String>>;

#[derive(Default)]
struct FakeState {
    sheets: HashMap<String, Grid>,
    query_results: VecDeque<Vec<Vec<Cell>>>,
    queries: Vec<String>,
    cleared: Vec<String>,
}

/// Clones share the same underlying state, so a test can keep a handle
/// while the store owns another.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a sheet so a later `create_sheet` hits the
    /// "already exists" path.
    pub fn seed_sheet(&self, sheet_name: &str) {
        self.state
            .borrow_mut()
            .sheets
            .insert(sheet_name.to_string(), Grid::new());
    }

    /// Queue the result of the next `query()` call.
    pub fn push_query_result(&self, rows: Vec<Vec<Cell>>) {
        self.state.borrow_mut().query_results.push_back(rows);
    }

    /// Every query text executed so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.state.borrow().queries.clone()
    }

    /// Every cleared range notation so far, in order.
    pub fn cleared(&self) -> Vec<String> {
        self.state.borrow().cleared.clone()
    }

    /// Snapshot of a sheet's grid (empty if the sheet does not exist).
    pub fn grid(&self, sheet_name: &str) -> Grid {
        self.state
            .borrow()
            .sheets
            .get(sheet_name)
            .cloned()
            .unwrap_or_default()
    }

    /// The cell at 1-based (row, col), empty string if blank.
    pub fn cell(&self, sheet_name: &str, row: usize, col: usize) -> String {
        self.grid(sheet_name)
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default()
    }
}

// =============================================================================
// Grid Plumbing
// =============================================================================

fn start_of(range: &A1Range) -> (usize, usize) {
    match &range.start {
        Some(sel) => {
            let col = if sel.column.is_empty() {
                1
            } else {
                letters_to_col(&sel.column) as usize
            };
            let row = if sel.row == 0 { 1 } else { sel.row as usize };
            (col, row)
        }
        None => (1, 1),
    }
}

fn ensure_size(grid: &mut Grid, rows: usize, cols: usize) {
    if grid.len() < rows {
        grid.resize(rows, Vec::new());
    }
    for row in grid.iter_mut().take(rows) {
        if row.len() < cols {
            row.resize(cols, String::new());
        }
    }
}

fn last_occupied_row(grid: &Grid) -> usize {
    grid.iter()
        .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

fn write_result(sheet: &str, start_col: usize, start_row: usize, values: &[Vec<String>]) -> MutationResult {
    let rows = values.len();
    let cols = values.iter().map(Vec::len).max().unwrap_or(0);
    let cells: usize = values.iter().map(Vec::len).sum();

    let notation = format!(
        "{}!{}{}:{}{}",
        sheet,
        col_to_letters(start_col as u32),
        start_row,
        col_to_letters((start_col + cols.max(1) - 1) as u32),
        start_row + rows.max(1) - 1,
    );

    MutationResult {
        updated_range: A1Range::from_notation(&notation),
        updated_rows: rows as u32,
        updated_columns: cols as u32,
        updated_cells: cells as u32,
        values: values.to_vec(),
    }
}

// =============================================================================
// Formula Evaluation
// =============================================================================

fn quoted_arg(formula: &str) -> &str {
    let open = formula.find('"').map(|i| i + 1).unwrap_or(0);
    let close = formula[open..]
        .find('"')
        .map(|i| open + i)
        .unwrap_or(formula.len());
    &formula[open..close]
}

fn referenced_sheet(after_key: &str) -> &str {
    let bang = match after_key.find('!') {
        Some(idx) => idx,
        None => return "",
    };
    let mut sheet = &after_key[..bang];
    if let Some(paren) = sheet.rfind('(') {
        sheet = &sheet[paren + 1..];
    }
    sheet.trim_matches(|c| c == ',' || c == ' ')
}

fn column(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Evaluate the formula shapes the engines emit; anything else echoes
/// back verbatim, like a plain value cell.
fn eval_formula(state: &FakeState, raw: &str, target_row: usize) -> String {
    if raw == "=ROW()" {
        return target_row.to_string();
    }

    if let Some(rest) = raw.strip_prefix("=MATCH(") {
        let key = quoted_arg(rest);
        let after_key = &rest[rest.find('"').map(|i| i + 2 + key.len()).unwrap_or(0)..];
        let grid = state.sheets.get(referenced_sheet(after_key));

        return grid
            .and_then(|g| g.iter().position(|row| column(row, 0) == key))
            .map(|idx| (idx + 1).to_string())
            .unwrap_or_else(|| "#N/A".to_string());
    }

    if let Some(rest) = raw.strip_prefix("=VLOOKUP(") {
        let key = quoted_arg(rest);
        let after_key = &rest[rest.find('"').map(|i| i + 2 + key.len()).unwrap_or(0)..];
        let grid = match state.sheets.get(referenced_sheet(after_key)) {
            Some(g) => g,
            None => return "#N/A".to_string(),
        };

        let mut rows: Vec<&Vec<String>> = grid.iter().collect();
        if after_key.contains("SORT(") {
            // The engines sort by the timestamp column, descending.
            rows.sort_by_key(|row| {
                std::cmp::Reverse(column(row, 2).parse::<u64>().unwrap_or(0))
            });
        }

        return rows
            .iter()
            .find(|row| column(row, 0) == key)
            .map(|row| column(row, 1).to_string())
            .unwrap_or_else(|| "#N/A".to_string());
    }

    raw.to_string()
}

// =============================================================================
// SheetTransport Implementation
// =============================================================================

impl SheetTransport for FakeTransport {
    fn create_sheet(&self, _spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.sheets.contains_key(sheet_name) {
            return Err(GridError::Transport(format!(
                "sheet {} already exists",
                sheet_name
            )));
        }

        state.sheets.insert(sheet_name.to_string(), Grid::new());
        Ok(())
    }

    fn append(
        &self,
        _spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
        _mode: InsertMode,
    ) -> Result<MutationResult> {
        let mut state = self.state.borrow_mut();
        let sheet = range.sheet_name.clone();
        if !state.sheets.contains_key(&sheet) {
            return Err(GridError::Transport(format!("no sheet {}", sheet)));
        }

        let start_row = last_occupied_row(&state.sheets[&sheet]) + 1;
        let evaluated: Vec<Vec<String>> = values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .map(|cell| eval_formula(&state, cell, start_row + i))
                    .collect()
            })
            .collect();

        let cols = evaluated.iter().map(Vec::len).max().unwrap_or(0);
        let grid = state.sheets.get_mut(&sheet).expect("checked above");
        ensure_size(grid, start_row - 1 + evaluated.len(), cols);
        for (i, row) in evaluated.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                grid[start_row - 1 + i][j] = cell.clone();
            }
        }

        Ok(write_result(&sheet, 1, start_row, &evaluated))
    }

    fn update(
        &self,
        _spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
    ) -> Result<MutationResult> {
        let mut state = self.state.borrow_mut();
        let sheet = range.sheet_name.clone();
        if !state.sheets.contains_key(&sheet) {
            return Err(GridError::Transport(format!("no sheet {}", sheet)));
        }

        let (start_col, start_row) = start_of(range);
        let evaluated: Vec<Vec<String>> = values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .map(|cell| eval_formula(&state, cell, start_row + i))
                    .collect()
            })
            .collect();

        let cols = evaluated.iter().map(Vec::len).max().unwrap_or(0);
        let grid = state.sheets.get_mut(&sheet).expect("checked above");
        ensure_size(grid, start_row - 1 + evaluated.len(), start_col - 1 + cols);
        for (i, row) in evaluated.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                grid[start_row - 1 + i][start_col - 1 + j] = cell.clone();
            }
        }

        Ok(write_result(&sheet, start_col, start_row, &evaluated))
    }

    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: &[BatchUpdateRequest],
    ) -> Result<Vec<MutationResult>> {
        requests
            .iter()
            .map(|req| self.update(spreadsheet_id, &req.range, &req.values))
            .collect()
    }

    fn clear(&self, _spreadsheet_id: &str, ranges: &[A1Range]) -> Result<()> {
        let mut state = self.state.borrow_mut();

        for range in ranges {
            state.cleared.push(range.notation());

            let sheet = range.sheet_name.clone();
            let grid = match state.sheets.get_mut(&sheet) {
                Some(g) => g,
                None => continue,
            };

            let (start_col, start_row) = start_of(range);
            let (end_col, end_row) = match &range.end {
                Some(sel) => (
                    if sel.column.is_empty() {
                        grid.iter().map(Vec::len).max().unwrap_or(0)
                    } else {
                        letters_to_col(&sel.column) as usize
                    },
                    if sel.row == 0 { grid.len() } else { sel.row as usize },
                ),
                None => (grid.iter().map(Vec::len).max().unwrap_or(0), grid.len()),
            };

            for row in start_row..=end_row.min(grid.len()) {
                let width = grid[row - 1].len();
                for col in start_col..=end_col.min(width) {
                    grid[row - 1][col - 1].clear();
                }
            }
        }

        Ok(())
    }

    fn query(
        &self,
        _spreadsheet_id: &str,
        _sheet_name: &str,
        query: &str,
        _has_header: bool,
    ) -> Result<Vec<Vec<Cell>>> {
        let mut state = self.state.borrow_mut();
        state.queries.push(query.to_string());
        Ok(state.query_results.pop_front().unwrap_or_default())
    }
}
