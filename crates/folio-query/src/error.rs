//! Error types for the query module.

use thiserror::Error;

use folio_store::StoreError;

/// Errors that can occur while planning or executing a listing.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Page numbers are 1-based.
    #[error("page must be positive, got {0}")]
    InvalidPage(i64),

    /// Page size must be positive.
    #[error("limit must be positive, got {0}")]
    InvalidLimit(i64),

    /// The requested sort field is not recognized.
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
