//! Row Store Engine
//!
//! Schema-aware tabular CRUD over one data sheet:
//!
//! - a static [`Schema`] maps field names to typed columns, declaration
//!   order = column order, with the implicit identity column first;
//! - [`Record`]s carry tri-state field values (unset / null / value);
//! - statements build queries against column letters and resolve row
//!   positions before batch-mutating by position.

pub mod query;
pub mod schema;
mod stmt;
mod store;

pub use query::{ColumnMapper, Order, QueryArg, QueryBuilder};
pub use schema::{
    FieldDef, FieldType, FieldValue, Record, Schema, SchemaBuilder, MAX_SAFE_INTEGER,
    RID_COLUMN_NAME,
};
pub use stmt::{CountStmt, DeleteStmt, InsertStmt, SelectStmt, UpdateStmt};
pub use store::RowStore;
