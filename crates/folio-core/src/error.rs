//! Error types for Folio core primitives.

use thiserror::Error;

use crate::document::Visibility;
use crate::types::UserId;

/// Errors from parsing and normalizing core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown visibility: {0}")]
    UnknownVisibility(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("malformed link token: expected 64 hex characters, got {0}")]
    MalformedToken(usize),

    #[error("tag name is empty after normalization")]
    EmptyTagName,
}

/// Violations of the document record invariants.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("title must be non-empty")]
    EmptyTitle,

    #[error("link visibility requires a link token")]
    MissingLinkToken,

    #[error("link token present under {0:?} visibility")]
    StrayLinkToken(Visibility),

    #[error("owner {0} must not appear in the share set")]
    OwnerInShareSet(UserId),

    #[error("duplicate share entry for user {0}")]
    DuplicateShareEntry(UserId),
}
