//! # Folio Store
//!
//! Storage abstraction for the Folio kernel. Provides trait-based
//! interfaces for document and tag persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`DocumentStore`] and
//! [`TagStore`] traits, keeping the kernel storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] / [`TagStore`] - The async traits for all storage
//!   operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`DocumentFilter`] / [`SortSpec`] - Compiled query inputs
//! - [`DocumentPatch`] / [`UpdateOutcome`] - Conditional update inputs and
//!   results
//!
//! ## Design Notes
//!
//! - **Token uniqueness**: link tokens are unique store-wide; collisions
//!   return `Conflict` and callers retry with fresh randomness
//! - **Conditional updates**: whole-record patches are gated on the
//!   document's version counter and bump it on success
//! - **Share atomicity**: grants and revokes are single-entry atomic
//!   operations, safe under concurrent calls for different users
//! - **Stable pagination**: every sort ends with the identifier tiebreak

pub mod error;
pub mod filter;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use filter::{AccessScope, DocumentFilter, SortField, SortOrder, SortSpec};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    check_share_entries, DocumentPatch, DocumentStore, NewDocumentRecord, TagStore, UpdateOutcome,
};
