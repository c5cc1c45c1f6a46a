//! Error types for the permissions module.

use thiserror::Error;

use folio_core::Visibility;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Sharing a document with its own owner.
    #[error("cannot share a document with its owner")]
    SelfShare,

    /// A token operation attempted outside Link visibility.
    #[error("token operation requires link visibility, document is {0:?}")]
    InvalidState(Visibility),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
