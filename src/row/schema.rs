//! Static row schema and tri-state field values
//!
//! A schema is built once per model — a mapping from field name to
//! `{type, column title, declared order}` — and shared by every record
//! of that model. Declaration order is column order on the sheet, with
//! the implicit identity column first.
//!
//! Field values are tri-state: `Unset` (never assigned; distinguishable
//! after partial selects/inserts), `Null` (explicitly empty), or a
//! concrete typed value.

use std::fmt;

use crate::error::{GridError, Result};

/// Name of the implicit leading identity column. Reserved: declaring a
/// field with this name is a schema error.
pub const RID_COLUMN_NAME: &str = "_rid";

/// Largest magnitude an integer field may hold: integers beyond ±2^53
/// are not exactly representable in IEEE-754 double precision and would
/// silently lose precision on the round trip through the transport.
pub const MAX_SAFE_INTEGER: i64 = 1 << 53;

/// Declared primitive type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    Bool,
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::String => "string",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// Tri-state value of one record field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// Never assigned. A field left out of an insert or a select stays
    /// unset, never defaulted to zero/empty.
    #[default]
    Unset,

    /// Explicitly empty.
    Null,

    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The cell text written to the sheet. Unset and null both store as
    /// an empty cell; the distinction lives on the record, not the wire.
    pub(crate) fn to_cell_string(&self) -> String {
        match self {
            FieldValue::Unset | FieldValue::Null => String::new(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
            FieldValue::Text(v) => v.clone(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

// =============================================================================
// Schema
// =============================================================================

/// One declared field: name, column title and type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    name: String,
    column_title: String,
    field_type: FieldType,
}

impl FieldDef {
    /// Declare a field; the column title defaults to the field name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column_title: name.clone(),
            name,
            field_type,
        }
    }

    /// Override the header-row title of this field's column.
    pub fn column_title(mut self, title: impl Into<String>) -> Self {
        self.column_title = title.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.column_title
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// The declared field layout of a row store, built once via
/// [`Schema::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Declared fields in declaration (= column) order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of `name` in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(FieldDef::new(name, FieldType::Integer))
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.field(FieldDef::new(name, FieldType::Float))
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(FieldDef::new(name, FieldType::Bool))
    }

    pub fn string(self, name: impl Into<String>) -> Self {
        self.field(FieldDef::new(name, FieldType::String))
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    pub fn build(self) -> Result<Schema> {
        if self.fields.is_empty() {
            return Err(GridError::Schema(
                "schema must declare at least one field".to_string(),
            ));
        }

        for (idx, field) in self.fields.iter().enumerate() {
            if field.name == RID_COLUMN_NAME {
                return Err(GridError::Schema(format!(
                    "{} is reserved for the identity column",
                    RID_COLUMN_NAME
                )));
            }
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(GridError::Schema(format!(
                    "duplicate field {}",
                    field.name
                )));
            }
        }

        Ok(Schema {
            fields: self.fields,
        })
    }
}

// =============================================================================
// Record
// =============================================================================

/// One row of a row store: a tri-state value per declared field plus the
/// store-assigned identity.
///
/// The identity is assigned at insert time and is never client-settable;
/// records created by the caller start with no identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Schema,
    rid: Option<u64>,
    values: Vec<FieldValue>,
}

impl Record {
    /// A record of `schema` with every field unset.
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            rid: None,
            values: vec![FieldValue::Unset; schema.len()],
        }
    }

    /// Assign `value` to `field`, validating the declared type and the
    /// safe-integer boundary.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<()> {
        let idx = self
            .schema
            .field_index(field)
            .ok_or_else(|| GridError::Schema(format!("unknown field {}", field)))?;

        let checked = check_value(&self.schema.fields()[idx], value.into())?;
        self.values[idx] = checked;
        Ok(())
    }

    /// Builder-style [`Record::set`] for constructing records inline.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn get(&self, field: &str) -> Result<&FieldValue> {
        let idx = self
            .schema
            .field_index(field)
            .ok_or_else(|| GridError::Schema(format!("unknown field {}", field)))?;
        Ok(&self.values[idx])
    }

    /// The physical row number assigned at insert time, if any.
    pub fn rid(&self) -> Option<u64> {
        self.rid
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn set_rid(&mut self, rid: u64) {
        self.rid = Some(rid);
    }

    pub(crate) fn set_raw(&mut self, idx: usize, value: FieldValue) {
        self.values[idx] = value;
    }

    pub(crate) fn values(&self) -> &[FieldValue] {
        &self.values
    }
}

/// Validate a value against a field declaration, widening integers into
/// float fields.
pub(crate) fn check_value(def: &FieldDef, value: FieldValue) -> Result<FieldValue> {
    let checked = match (def.field_type(), value) {
        (_, FieldValue::Unset) => FieldValue::Unset,
        (_, FieldValue::Null) => FieldValue::Null,
        (FieldType::Integer, FieldValue::Int(v)) => {
            if !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v) {
                return Err(GridError::Schema(format!(
                    "field {}: {} exceeds the safe integer range (±2^53)",
                    def.name(),
                    v
                )));
            }
            FieldValue::Int(v)
        }
        (FieldType::Float, FieldValue::Float(v)) => FieldValue::Float(v),
        (FieldType::Float, FieldValue::Int(v)) => FieldValue::Float(v as f64),
        (FieldType::Bool, FieldValue::Bool(v)) => FieldValue::Bool(v),
        (FieldType::String, FieldValue::Text(v)) => FieldValue::Text(v),
        (expected, got) => {
            return Err(GridError::Schema(format!(
                "field {}: expected {} value, got {:?}",
                def.name(),
                expected,
                got
            )));
        }
    };

    Ok(checked)
}
