//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Uniqueness violation (link token or tag name already taken).
    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    /// Record violates a structural invariant.
    #[error("invalid record: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The store's lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// A blocking task failed to complete.
    #[error("background task failed: {0}")]
    Background(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
