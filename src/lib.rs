//! # gridstore
//!
//! A lightweight key-value store and row-oriented store built entirely on
//! top of the Google Sheets mutation and query primitives. No database
//! server: a spreadsheet is the persistent store, and this crate is the
//! translation layer that simulates store semantics — point lookups,
//! conditional updates, ordered/paginated scans, row identity — on a
//! substrate with no native indexing, no transactions, and no stable row
//! identifiers beyond position.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────────────┐
//! │   Key-Value Engine   │   │       Row Store Engine       │
//! │  (two strategies)    │   │  (typed schema, statements)  │
//! └─────────┬────────────┘   └──────────────┬───────────────┘
//!           │     formulas / queries        │
//!           ▼                               ▼
//! ┌─────────────────┐  ┌───────────────┐  ┌────────────────┐
//! │ Cell Addressing │  │  Scratchpad   │  │ Query Builder  │
//! │  (A1 notation)  │  │  Allocator    │  │ (SELECT/WHERE) │
//! └─────────────────┘  └───────┬───────┘  └────────────────┘
//!                              │
//!                              ▼
//!                    ┌──────────────────┐
//!                    │  Sheet Transport │
//!                    │ (append/update/  │
//!                    │  clear/query)    │
//!                    └──────────────────┘
//! ```
//!
//! The concurrency model is deliberately simple: synchronous blocking
//! calls, no internal retries, no cross-instance locking. Resolve-then-
//! mutate sequences race under concurrent writers and the last physical
//! write wins.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod a1;
pub mod codec;
pub(crate) mod formula;
pub mod scratchpad;
pub mod transport;
pub mod kv;
pub mod row;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{KvConfig, KvMode, RowConfig};
pub use error::{GridError, Result};

pub use a1::{A1Range, CellSelector};
pub use codec::{Codec, PrefixCodec};
pub use kv::KvStore;
pub use row::{
    FieldDef, FieldType, FieldValue, Order, QueryArg, Record, RowStore, Schema, SchemaBuilder,
};
pub use transport::google::{CredentialProvider, GoogleSheetTransport, StaticToken};
pub use transport::{BatchUpdateRequest, Cell, InsertMode, MutationResult, SheetTransport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gridstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
