//! The error taxonomy of the Folio kernel.
//!
//! Every request-level operation returns one of these variants; the
//! request layer maps each to a transport status. The kernel itself never
//! formats a transport response.

use thiserror::Error;

use folio_core::{CoreError, ValidationError};
use folio_perms::PermsError;
use folio_query::QueryError;
use folio_store::StoreError;

/// Errors returned by [`crate::DocumentService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The document (or tag) is absent, or an access filter excludes it.
    /// Deliberately indistinguishable from "exists but forbidden" on read
    /// paths, so existence never leaks.
    #[error("not found")]
    NotFound,

    /// The access-control engine denied the action.
    #[error("not authorized")]
    Unauthorized,

    /// A token operation was attempted outside link visibility.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input: empty title or tag, self-share, bad pagination,
    /// unknown sort field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness collision that survived retries, or a conditional
    /// update that lost to a concurrent writer.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A storage backend fault.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::InvalidData(msg) => ServiceError::InvalidInput(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<PermsError> for ServiceError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::SelfShare => ServiceError::InvalidInput(err.to_string()),
            PermsError::InvalidState(_) => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(e) => e.into(),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
