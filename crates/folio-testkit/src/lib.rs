//! # Folio Testkit
//!
//! Testing utilities shared across the Folio workspace: memory-backed
//! service fixtures and proptest generators that respect the document
//! record invariants.
//!
//! ## Key Types
//!
//! - [`TestFixture`] - a [`folio::DocumentService`] over a fresh
//!   [`folio_store::MemoryStore`], with seeding helpers
//! - [`generators`] - proptest strategies for identifiers, records, and
//!   share sets

pub mod fixtures;
pub mod generators;

pub use fixtures::TestFixture;
