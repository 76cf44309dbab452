//! Error types for gridstore
//!
//! Provides a unified error type for all operations.
//!
//! None of these are retried internally; every failure surfaces to the
//! caller synchronously. The one intentional exception is idempotent sheet
//! creation at store construction, where the stores swallow the failure at
//! the call site (see `KvStore::open` / `RowStore::open`).

use thiserror::Error;

/// Result type alias using GridError
pub type Result<T> = std::result::Result<T, GridError>;

/// Unified error type for gridstore operations
#[derive(Debug, Error)]
pub enum GridError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// The backing call itself failed (network/auth/quota/bad request).
    /// Carries whatever diagnostic the backend supplied.
    #[error("transport error: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Key-Value Errors
    // -------------------------------------------------------------------------
    /// A lookup found no matching key. Expected, recoverable condition.
    #[error("key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    /// Malformed query construction (placeholder/argument mismatch, negative
    /// limit or offset, unknown field). Raised before any network call.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// An operation was invoked on a store instance after `close()`.
    #[error("store is closed")]
    InvalidOperation,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// The codec received empty or prefix-less data: corruption, or a
    /// foreign writer bypassed the codec.
    #[error("decoding error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    /// A field is not declared on the schema, has the wrong type, or a
    /// numeric value exceeds the safe-integer boundary.
    #[error("schema error: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for GridError {
    fn from(err: reqwest::Error) -> Self {
        GridError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Transport(format!("malformed response body: {}", err))
    }
}
