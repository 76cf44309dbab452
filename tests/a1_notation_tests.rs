//! Tests for A1 cell addressing
//!
//! These tests verify:
//! - Column letter conversion is a bijection on positive integers
//! - Boundary crossings at the base-26 wrap points
//! - Selector parsing (letters / digits / both)
//! - Range notation round trips, including single-cell normalization

use gridstore::a1::{col_to_letters, letters_to_col, A1Range, CellSelector};

// =============================================================================
// Column Letter Conversion
// =============================================================================

#[test]
fn test_col_to_letters_known_values() {
    assert_eq!(col_to_letters(1), "A");
    assert_eq!(col_to_letters(2), "B");
    assert_eq!(col_to_letters(26), "Z");
    assert_eq!(col_to_letters(27), "AA");
    assert_eq!(col_to_letters(28), "AB");
    assert_eq!(col_to_letters(52), "AZ");
    assert_eq!(col_to_letters(53), "BA");
    assert_eq!(col_to_letters(702), "ZZ");
    assert_eq!(col_to_letters(703), "AAA");
}

#[test]
fn test_col_to_letters_zero_is_empty() {
    // 0 means "whole row" in selector context.
    assert_eq!(col_to_letters(0), "");
}

#[test]
fn test_letters_to_col_known_values() {
    assert_eq!(letters_to_col("A"), 1);
    assert_eq!(letters_to_col("Z"), 26);
    assert_eq!(letters_to_col("AA"), 27);
    assert_eq!(letters_to_col("ZZ"), 702);
    assert_eq!(letters_to_col("AAA"), 703);
}

#[test]
fn test_letters_to_col_accepts_lowercase() {
    assert_eq!(letters_to_col("aa"), 27);
}

#[test]
fn test_column_conversion_is_a_bijection() {
    for n in 1..=20_000u32 {
        let letters = col_to_letters(n);
        assert_eq!(
            letters_to_col(&letters),
            n,
            "round trip failed for column {} ({})",
            n,
            letters
        );
    }
}

// =============================================================================
// Cell Selectors
// =============================================================================

#[test]
fn test_selector_parsing() {
    assert_eq!(
        CellSelector::from_notation("A"),
        CellSelector {
            column: "A".to_string(),
            row: 0
        }
    );
    assert_eq!(
        CellSelector::from_notation("1"),
        CellSelector {
            column: String::new(),
            row: 1
        }
    );
    assert_eq!(
        CellSelector::from_notation("A1"),
        CellSelector {
            column: "A".to_string(),
            row: 1
        }
    );
    assert_eq!(
        CellSelector::from_notation("AAA123"),
        CellSelector {
            column: "AAA".to_string(),
            row: 123
        }
    );
}

#[test]
fn test_selector_from_rc() {
    assert_eq!(CellSelector::from_rc(2, 3).to_string(), "B3");
    assert_eq!(CellSelector::whole_column(27).to_string(), "AA");
    assert_eq!(CellSelector::whole_row(5).to_string(), "5");
}

// =============================================================================
// Range Notation
// =============================================================================

fn round_trip(notation: &str) -> String {
    A1Range::from_notation(notation).to_string()
}

#[test]
fn test_range_round_trips_identically() {
    for notation in [
        "Sheet1!A1:B2",
        "Sheet1!A:A",
        "Sheet1!1:2",
        "Sheet1!A5:A",
        "A1:B2",
        "Sheet1",
        "'My Custom Sheet'!A:A",
        "'My Custom Sheet'",
    ] {
        assert_eq!(round_trip(notation), notation);
    }
}

#[test]
fn test_bare_sheet_name_has_no_bounds() {
    let range = A1Range::from_notation("Sheet1");
    assert_eq!(range.sheet_name, "Sheet1");
    assert!(range.start.is_none());
    assert!(range.end.is_none());
}

#[test]
fn test_bare_single_cell_normalizes_once() {
    // Not identity on the very first pass, idempotent afterwards.
    assert_eq!(round_trip("A1"), "A1:A1");
    assert_eq!(round_trip("A1:A1"), "A1:A1");
}

#[test]
fn test_single_cell_after_sheet_normalizes() {
    assert_eq!(round_trip("data_scratch!A1"), "data_scratch!A1:A1");
}

#[test]
fn test_range_parse_extracts_bounds() {
    let range = A1Range::from_notation("Sheet1!A1:B2");
    assert_eq!(range.sheet_name, "Sheet1");
    assert_eq!(
        range.start,
        Some(CellSelector {
            column: "A".to_string(),
            row: 1
        })
    );
    assert_eq!(
        range.end,
        Some(CellSelector {
            column: "B".to_string(),
            row: 2
        })
    );
}

#[test]
fn test_range_constructors() {
    assert_eq!(A1Range::from_sheet("data").to_string(), "data");
    assert_eq!(A1Range::whole_row("data", 7).to_string(), "data!7:7");
    assert_eq!(
        A1Range::cell("data", CellSelector::from_rc(4, 2)).to_string(),
        "data!D2:D2"
    );
    assert_eq!(
        A1Range::bounded(
            "data",
            CellSelector::whole_column(1),
            CellSelector::whole_column(3)
        )
        .to_string(),
        "data!A:C"
    );
}

#[test]
fn test_range_without_sheet_name() {
    let range = A1Range::from_notation("A1:B2");
    assert_eq!(range.sheet_name, "");
    assert_eq!(range.to_string(), "A1:B2");
}
