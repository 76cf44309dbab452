//! Query builder
//!
//! Assembles the `SELECT ... WHERE ... ORDER BY ... LIMIT ... OFFSET`
//! expression sent to the transport's tabular query endpoint. Field name
//! tokens are substituted for their spreadsheet column letters before the
//! expression leaves the builder.
//!
//! All validation failures are raised synchronously at builder call time,
//! before any network call is made.

use std::fmt;

use crate::error::{GridError, Result};

/// Sort direction of one ORDER BY key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        })
    }
}

// =============================================================================
// Query Arguments
// =============================================================================

/// A positional argument filling one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl QueryArg {
    /// Render the argument as a query literal.
    ///
    /// The query language has no in-literal quote escaping, so string
    /// arguments pick whichever quote kind they do not contain; a string
    /// containing both kinds cannot be represented safely and is
    /// rejected.
    fn to_literal(&self) -> Result<String> {
        match self {
            QueryArg::Int(v) => Ok(v.to_string()),
            QueryArg::Float(v) => Ok(v.to_string()),
            QueryArg::Bool(v) => Ok(v.to_string()),
            QueryArg::Text(v) => {
                if !v.contains('"') {
                    Ok(format!("\"{}\"", v))
                } else if !v.contains('\'') {
                    Ok(format!("'{}'", v))
                } else {
                    Err(GridError::InvalidQuery(
                        "string argument contains both quote kinds".to_string(),
                    ))
                }
            }
        }
    }
}

impl From<i64> for QueryArg {
    fn from(v: i64) -> Self {
        QueryArg::Int(v)
    }
}

impl From<i32> for QueryArg {
    fn from(v: i32) -> Self {
        QueryArg::Int(v as i64)
    }
}

impl From<f64> for QueryArg {
    fn from(v: f64) -> Self {
        QueryArg::Float(v)
    }
}

impl From<bool> for QueryArg {
    fn from(v: bool) -> Self {
        QueryArg::Bool(v)
    }
}

impl From<&str> for QueryArg {
    fn from(v: &str) -> Self {
        QueryArg::Text(v.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(v: String) -> Self {
        QueryArg::Text(v)
    }
}

// =============================================================================
// Column Mapper
// =============================================================================

/// Field name → column letter substitution table.
///
/// Rewriting is a single pass over identifier tokens, so a field name is
/// only ever replaced as a whole word (a field `a` never corrupts `age`)
/// and text inside quoted string literals is left alone.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    entries: Vec<(String, String)>,
}

impl ColumnMapper {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    fn column_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, col)| col.as_str())
    }

    /// Replace every identifier token that names a mapped field with its
    /// column letter.
    pub fn rewrite(&self, expr: &str) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut chars = expr.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c == '"' || c == '\'' {
                // Copy quoted literals verbatim through the closing quote.
                out.push(c);
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if inner == c {
                        break;
                    }
                }
            } else if c.is_ascii_alphabetic() || c == '_' {
                let mut end = start + c.len_utf8();
                while let Some((idx, next)) = chars.peek().copied() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        end = idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }

                let word = &expr[start..end];
                match self.column_for(word) {
                    Some(col) => out.push_str(col),
                    None => out.push_str(word),
                }
            } else {
                out.push(c);
            }
        }

        out
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// Builder of one SELECT expression.
///
/// `limit`/`offset` keep the original convention that zero means "no
/// clause".
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    mapper: ColumnMapper,
    condition: Option<(String, Vec<QueryArg>)>,
    orderings: Vec<(String, Order)>,
    limit: i64,
    offset: i64,
}

impl QueryBuilder {
    pub fn new(mapper: ColumnMapper) -> Self {
        Self {
            mapper,
            condition: None,
            orderings: Vec::new(),
            limit: 0,
            offset: 0,
        }
    }

    /// Install a placeholder-free base predicate. The row store seeds
    /// every builder with its identity-not-null clause through this.
    pub(crate) fn base_condition(mut self, condition: &str) -> Self {
        self.condition = Some((condition.to_string(), Vec::new()));
        self
    }

    /// Set the WHERE clause from a `?`-placeholder template and its
    /// positional arguments. Replaces any previous clause.
    pub fn where_clause(mut self, condition: &str, args: Vec<QueryArg>) -> Result<Self> {
        let placeholders = condition.matches('?').count();
        if placeholders != args.len() {
            return Err(GridError::InvalidQuery(
                "number of placeholders and arguments is not equal".to_string(),
            ));
        }

        self.condition = Some((condition.to_string(), args));
        Ok(self)
    }

    /// Append one ORDER BY key; `field` must be a mapped field name.
    pub fn order_by(mut self, field: &str, order: Order) -> Result<Self> {
        if !self.mapper.contains(field) {
            return Err(GridError::InvalidQuery(format!(
                "unrecognised field {}",
                field
            )));
        }

        self.orderings.push((field.to_string(), order));
        Ok(self)
    }

    pub fn limit(mut self, limit: i64) -> Result<Self> {
        if limit < 0 {
            return Err(GridError::InvalidQuery(
                "limit can't be less than 0".to_string(),
            ));
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn offset(mut self, offset: i64) -> Result<Self> {
        if offset < 0 {
            return Err(GridError::InvalidQuery(
                "offset can't be less than 0".to_string(),
            ));
        }
        self.offset = offset;
        Ok(self)
    }

    /// Emit the SELECT expression over `columns` (field names or
    /// aggregate forms over field names), omitting empty clauses.
    pub fn build_select(&self, columns: &[String]) -> Result<String> {
        let cols: Vec<String> = columns.iter().map(|c| self.mapper.rewrite(c)).collect();

        let mut parts = vec![format!("SELECT {}", cols.join(","))];
        if let Some(where_part) = self.build_where()? {
            parts.push(where_part);
        }
        if let Some(order_part) = self.build_order_by() {
            parts.push(order_part);
        }
        if self.limit > 0 {
            parts.push(format!("LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            parts.push(format!("OFFSET {}", self.offset));
        }

        Ok(parts.join(" "))
    }

    fn build_where(&self) -> Result<Option<String>> {
        let (condition, args) = match &self.condition {
            Some(c) => c,
            None => return Ok(None),
        };

        // Columns are substituted before argument interpolation so field
        // names inside interpolated string literals survive untouched.
        let rewritten = self.mapper.rewrite(condition);

        let mut out = String::from("WHERE ");
        let mut segments = rewritten.split('?');
        if let Some(first) = segments.next() {
            out.push_str(first);
        }
        for (segment, arg) in segments.zip(args.iter()) {
            out.push_str(&arg.to_literal()?);
            out.push_str(segment);
        }

        Ok(Some(out))
    }

    fn build_order_by(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }

        let parts: Vec<String> = self
            .orderings
            .iter()
            .map(|(field, order)| format!("{} {}", self.mapper.rewrite(field), order))
            .collect();

        Some(format!("ORDER BY {}", parts.join(", ")))
    }
}
