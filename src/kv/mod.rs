//! Key-Value Engine
//!
//! A key-value store over one data sheet with `(key, value, timestamp)`
//! columns, in one of two storage strategies:
//!
//! - [`KvMode::Default`](crate::KvMode::Default): point-update table —
//!   a key owns at most one physical row, overwritten in place.
//! - [`KvMode::AppendOnly`](crate::KvMode::AppendOnly): append-only log —
//!   the row with the greatest timestamp wins; deletes append tombstones.
//!
//! Lookups run as spreadsheet formulas evaluated through the store's
//! scratchpad cell; see the module docs of [`crate::scratchpad`].

mod store;

pub use store::KvStore;
