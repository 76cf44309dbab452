//! Tests for the query builder
//!
//! These tests verify:
//! - SELECT assembly with optional WHERE/ORDER BY/LIMIT/OFFSET clauses
//! - Placeholder/argument validation before any network call
//! - Field-to-column substitution as whole identifier tokens only
//! - String literal quoting rules

use gridstore::row::{ColumnMapper, Order, QueryArg, QueryBuilder};
use gridstore::GridError;

fn mapper() -> ColumnMapper {
    ColumnMapper::new(vec![
        ("_rid".to_string(), "A".to_string()),
        ("col_1".to_string(), "B".to_string()),
        ("col_2".to_string(), "C".to_string()),
    ])
}

fn builder() -> QueryBuilder {
    QueryBuilder::new(mapper())
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// =============================================================================
// SELECT Assembly
// =============================================================================

#[test]
fn test_plain_select() {
    let query = builder().build_select(&cols(&["col_1", "col_2"])).unwrap();
    assert_eq!(query, "SELECT B,C");
}

#[test]
fn test_select_with_where() {
    let query = builder()
        .where_clause("_rid IS NOT NULL AND col_1 = ?", vec!["hello".into()])
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B WHERE A IS NOT NULL AND B = \"hello\"");
}

#[test]
fn test_select_with_all_clauses() {
    let query = builder()
        .where_clause("col_1 = ?", vec!["hello".into()])
        .unwrap()
        .order_by("col_2", Order::Desc)
        .unwrap()
        .order_by("col_1", Order::Asc)
        .unwrap()
        .limit(10)
        .unwrap()
        .offset(5)
        .unwrap()
        .build_select(&cols(&["col_1", "col_2"]))
        .unwrap();

    assert_eq!(
        query,
        "SELECT B,C WHERE B = \"hello\" ORDER BY C DESC, B ASC LIMIT 10 OFFSET 5"
    );
}

#[test]
fn test_zero_limit_and_offset_are_omitted() {
    let query = builder()
        .limit(0)
        .unwrap()
        .offset(0)
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B");
}

#[test]
fn test_aggregate_column_is_rewritten() {
    let query = builder().build_select(&cols(&["COUNT(_rid)"])).unwrap();
    assert_eq!(query, "SELECT COUNT(A)");
}

// =============================================================================
// Argument Interpolation
// =============================================================================

#[test]
fn test_numeric_and_boolean_literals() {
    let query = builder()
        .where_clause(
            "col_1 > ? AND col_2 = ? AND col_1 = ?",
            vec![10.into(), true.into(), 2.5.into()],
        )
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B WHERE B > 10 AND C = true AND B = 2.5");
}

#[test]
fn test_string_with_double_quote_uses_single_quotes() {
    let query = builder()
        .where_clause("col_1 = ?", vec!["he said \"hi\"".into()])
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B WHERE B = 'he said \"hi\"'");
}

#[test]
fn test_string_with_both_quote_kinds_is_rejected() {
    let result = builder()
        .where_clause("col_1 = ?", vec!["both \" and '".into()])
        .unwrap()
        .build_select(&cols(&["col_1"]));

    assert!(matches!(result, Err(GridError::InvalidQuery(_))));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_placeholder_argument_mismatch() {
    let result = builder().where_clause("col_1 = ? AND col_2 = ?", vec!["only one".into()]);
    assert!(matches!(result, Err(GridError::InvalidQuery(_))));

    let result = builder().where_clause("col_1 = ?", Vec::<QueryArg>::new());
    assert!(matches!(result, Err(GridError::InvalidQuery(_))));
}

#[test]
fn test_negative_limit_rejected() {
    assert!(matches!(
        builder().limit(-1),
        Err(GridError::InvalidQuery(_))
    ));
}

#[test]
fn test_negative_offset_rejected() {
    assert!(matches!(
        builder().offset(-1),
        Err(GridError::InvalidQuery(_))
    ));
}

#[test]
fn test_order_by_unknown_field_rejected() {
    assert!(matches!(
        builder().order_by("nope", Order::Asc),
        Err(GridError::InvalidQuery(_))
    ));
}

// =============================================================================
// Identifier Substitution
// =============================================================================

#[test]
fn test_substitution_never_splits_words() {
    // A field named "a" must not corrupt the longer field "age".
    let mapper = ColumnMapper::new(vec![
        ("a".to_string(), "B".to_string()),
        ("age".to_string(), "C".to_string()),
    ]);

    let query = QueryBuilder::new(mapper)
        .where_clause("a = 1 AND age = 2", vec![])
        .unwrap()
        .build_select(&cols(&["age"]))
        .unwrap();

    assert_eq!(query, "SELECT C WHERE B = 1 AND C = 2");
}

#[test]
fn test_substitution_skips_string_literals() {
    let query = builder()
        .where_clause("col_1 = \"col_1\" AND col_2 = 'col_2'", vec![])
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B WHERE B = \"col_1\" AND C = 'col_2'");
}

#[test]
fn test_interpolated_arguments_are_not_rewritten() {
    // Columns substitute before arguments interpolate, so an argument
    // that happens to name a field stays data.
    let query = builder()
        .where_clause("col_1 = ?", vec!["col_2".into()])
        .unwrap()
        .build_select(&cols(&["col_1"]))
        .unwrap();

    assert_eq!(query, "SELECT B WHERE B = \"col_2\"");
}
