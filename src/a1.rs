//! A1 notation cell addressing
//!
//! Parses and formats range notation ("Sheet1!A1:B2") and converts between
//! 1-based column indices and their letter form. Pure module, no I/O.
//!
//! Column letters are bijective base-26: there is no letter for zero, so
//! column 1 is "A", 26 is "Z" and 27 is "AA" (not "A0").

use std::fmt;

/// Convert a 1-based column index to its letter form.
///
/// Returns the empty string for 0, which in selector context means
/// "the whole row".
pub fn col_to_letters(mut col_idx: u32) -> String {
    let mut letters = Vec::new();

    while col_idx > 0 {
        let cur = (col_idx - 1) % 26;
        letters.push(b'A' + cur as u8);
        col_idx = (col_idx - cur - 1) / 26;
    }

    letters.reverse();
    // Only ASCII uppercase bytes are pushed above.
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert a column letter string back to its 1-based index.
///
/// Exact inverse of [`col_to_letters`] for every index >= 1. Lowercase
/// letters are accepted; non-letter characters are ignored, matching the
/// lenient selector parsing below.
pub fn letters_to_col(letters: &str) -> u32 {
    letters
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold(0u32, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        })
}

// =============================================================================
// Cell Selector
// =============================================================================

/// One bound of an A1 range: a column letter part and a row part.
///
/// An empty `column` selects the whole column dimension; a zero `row`
/// selects the whole row dimension. A selector with both parts empty is
/// only meaningful as part of a range referring to all cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSelector {
    /// Column letters ("" means the entire column).
    pub column: String,
    /// 1-based row number (0 means the entire row).
    pub row: u32,
}

impl CellSelector {
    /// Build a selector from 1-based column/row indices; 0 leaves the
    /// corresponding part unbounded.
    pub fn from_rc(column: u32, row: u32) -> Self {
        Self {
            column: col_to_letters(column),
            row,
        }
    }

    /// Selector covering a whole row.
    pub fn whole_row(row: u32) -> Self {
        Self {
            column: String::new(),
            row,
        }
    }

    /// Selector covering a whole column.
    pub fn whole_column(column: u32) -> Self {
        Self {
            column: col_to_letters(column),
            row: 0,
        }
    }

    /// Parse a selector from notation ("A", "1", "A1", "AAA123").
    ///
    /// Splits the leading letters (column) from the trailing digits (row);
    /// either part may be absent. Never fails: text with no digits is all
    /// column, text with no letters is all row.
    pub fn from_notation(notation: &str) -> Self {
        let split = notation
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(notation.len());

        let column = notation[..split].to_string();
        let row = notation[split..].parse().unwrap_or(0);

        Self { column, row }
    }
}

impl fmt::Display for CellSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        if self.row > 0 {
            write!(f, "{}", self.row)?;
        }
        Ok(())
    }
}

// =============================================================================
// A1 Range
// =============================================================================

/// A sheet name plus an optional start/end cell pair addressing a
/// contiguous rectangular region.
///
/// If both `start` and `end` are absent the range denotes the entire
/// named sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct A1Range {
    pub sheet_name: String,
    pub start: Option<CellSelector>,
    pub end: Option<CellSelector>,
}

impl A1Range {
    /// Range denoting an entire sheet.
    pub fn from_sheet(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            start: None,
            end: None,
        }
    }

    /// Range covering a single cell (start == end).
    pub fn cell(sheet_name: impl Into<String>, selector: CellSelector) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            start: Some(selector.clone()),
            end: Some(selector),
        }
    }

    /// Range covering one whole row ("Sheet!3:3").
    pub fn whole_row(sheet_name: impl Into<String>, row: u32) -> Self {
        Self::cell(sheet_name, CellSelector::whole_row(row))
    }

    /// Bounded range between two selectors.
    pub fn bounded(sheet_name: impl Into<String>, start: CellSelector, end: CellSelector) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parse range notation.
    ///
    /// Splits on `!` to extract the sheet name. Text with no `:` and no `!`
    /// is a bare sheet name with no cell bounds — unless it has the shape
    /// of a cell reference (at most three column letters followed by a row
    /// number, like `"A1"`), which is taken as a single cell. A single
    /// cell is treated as start = end, so `"A1"` round-trips to `"A1:A1"`
    /// after the first pass (idempotent from then on).
    pub fn from_notation(notation: &str) -> Self {
        let (sheet_name, cells) = match notation.find('!') {
            Some(pos) => (&notation[..pos], &notation[pos + 1..]),
            None if !notation.contains(':') && !is_cell_reference(notation) => (notation, ""),
            None => ("", notation),
        };

        let (start, end) = if cells.is_empty() {
            (None, None)
        } else {
            match cells.split_once(':') {
                Some((start_raw, end_raw)) => (
                    Some(CellSelector::from_notation(start_raw)),
                    Some(CellSelector::from_notation(end_raw)),
                ),
                None => {
                    let cell = CellSelector::from_notation(cells);
                    (Some(cell.clone()), Some(cell))
                }
            }
        };

        Self {
            sheet_name: sheet_name.to_string(),
            start,
            end,
        }
    }

    /// The notation string for this range, e.g. `"Sheet1!A1:B2"`.
    pub fn notation(&self) -> String {
        self.to_string()
    }
}

/// Whether bare notation (no `!`, no `:`) denotes a single cell rather
/// than a sheet name. The two are syntactically ambiguous ("Sheet1" is
/// also letters-then-digits), so the usual convention applies: at most
/// three column letters followed by a row number reads as a cell.
fn is_cell_reference(notation: &str) -> bool {
    let letters = notation.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    (1..=3).contains(&letters)
        && notation.len() > letters
        && notation[letters..].chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for A1Range {
    /// Inverse of [`A1Range::from_notation`]. A range with both bounds
    /// present always serializes with an explicit `start:end` pair; the
    /// sheet name is joined with `!` only when cell bounds follow it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.sheet_name.is_empty() {
            write!(f, "{}", self.sheet_name)?;
        }

        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            if !self.sheet_name.is_empty() {
                write!(f, "!")?;
            }
            write!(f, "{}:{}", start, end)?;
        }

        Ok(())
    }
}
