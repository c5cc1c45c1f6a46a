//! # Folio Core
//!
//! Pure primitives for the Folio document kernel: records, identifiers,
//! link tokens, and validation.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over document data structures.
//!
//! ## Key Types
//!
//! - [`Document`] - The document record with its sharing and visibility state
//! - [`DocumentId`], [`UserId`], [`TagId`] - Opaque 16-byte identifiers
//! - [`LinkToken`] - 256-bit secret granting read access under Link visibility
//! - [`Visibility`] - Private / Public / Link access modes
//! - [`Permission`] - Read / Edit, attached to grantees only
//!
//! ## Invariants
//!
//! Every persisted document satisfies the checks in [`validation`]: a
//! non-empty title, `link_token` present exactly when visibility is Link,
//! and a share set with at most one entry per user and never the owner.

pub mod document;
pub mod error;
pub mod tag;
pub mod token;
pub mod types;
pub mod validation;

pub use document::{Document, Permission, ShareEntry, Visibility};
pub use error::{CoreError, ValidationError};
pub use tag::{normalize_tag_name, Tag};
pub use token::{LinkToken, TOKEN_HEX_LEN};
pub use types::{DocumentId, TagId, UserId};
pub use validation::validate_document;
