//! # Folio
//!
//! The unified API for the Folio document kernel - ownership, sharing,
//! visibility, and access-scoped listing of rich-text documents.
//!
//! ## Overview
//!
//! Folio decides who may read, edit, or administer a document, governs the
//! private/public/link visibility states and the link-token lifecycle, and
//! lists exactly the documents an actor is entitled to see. Transport,
//! request parsing, and authentication live outside this workspace; the
//! kernel consumes an authenticated actor identity and returns records or
//! a structured [`ServiceError`].
//!
//! ## Key Concepts
//!
//! - **Owner**: fixed at creation; holds every permission implicitly.
//! - **Grantee**: a user with a `read` or `edit` share entry.
//! - **Visibility**: `private` (owner and grantees), `public` (any
//!   authenticated reader), `link` (any holder of the secret token).
//! - **Link token**: 256-bit secret, present exactly while visibility is
//!   `link`, globally unique.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use folio::{DocumentService, NewDocument, ServiceConfig};
//! use folio::core::{UserId, Visibility};
//! use folio::store::SqliteStore;
//!
//! async fn example() {
//!     let store = Arc::new(SqliteStore::open("folio.db").unwrap());
//!     let service = DocumentService::new(
//!         Arc::clone(&store),
//!         store,
//!         ServiceConfig::default(),
//!     );
//!
//!     let owner = UserId::generate();
//!     let doc = service
//!         .create_document(
//!             owner,
//!             NewDocument {
//!                 visibility: Visibility::Link,
//!                 ..NewDocument::titled("launch plan")
//!             },
//!         )
//!         .await
//!         .unwrap();
//!
//!     // Anyone holding the rendered token can read the document.
//!     let token = doc.link_token.unwrap().to_hex();
//!     let _ = service.get_by_link_token(&token).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `folio::core` - records, identifiers, tokens, validation
//! - `folio::perms` - access decisions, grants, the visibility machine
//! - `folio::store` - store traits, SQLite and in-memory backends
//! - `folio::query` - list options, planning, pagination

pub mod error;
pub mod service;
pub mod tags;

// Re-export component crates
pub use folio_core as core;
pub use folio_perms as perms;
pub use folio_query as query;
pub use folio_store as store;

// Re-export main types for convenience
pub use error::{Result, ServiceError};
pub use service::{
    DocumentReplace, DocumentService, DocumentUpdate, NewDocument, ServiceConfig,
};
pub use tags::TagResolver;

// Re-export commonly used component types
pub use folio_core::{
    Document, DocumentId, LinkToken, Permission, ShareEntry, Tag, TagId, UserId, Visibility,
};
pub use folio_query::{ListOptions, Page, PageMeta, VisibilityScope};
