//! Error types for the store module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON encoding or decoding of a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store was closed; no further operations are possible.
    #[error("store is closed")]
    Closed,

    /// The store was opened read-only and cannot accept writes.
    #[error("store is read-only")]
    ReadOnly,

    /// No database exists at the given path.
    #[error("no session store at {}", .0.display())]
    NotFound(PathBuf),

    /// The database belongs to another account and was left untouched.
    #[error("session store belongs to {user_id} on {homeserver}")]
    ForeignOwner { user_id: String, homeserver: String },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Blocking database task failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),

    /// Backend-specific failure reported by a non-SQLite store.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
