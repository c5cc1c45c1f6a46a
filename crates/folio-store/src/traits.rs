//! Store traits: the abstract interface for document and tag persistence.
//!
//! These traits keep the kernel storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests). Both enforce the same
//! guarantees: link tokens and tag names are unique store-wide, whole-record
//! updates are gated on the version counter, and share mutations are atomic
//! per entry.

use async_trait::async_trait;
use std::collections::BTreeSet;

use folio_core::{
    Document, DocumentId, LinkToken, Permission, ShareEntry, Tag, TagId, UserId, Visibility,
};

use crate::error::Result;
use crate::filter::{DocumentFilter, SortSpec};

/// Input for creating a document. The store assigns the identifier, the
/// version counter, and both timestamps.
#[derive(Debug, Clone)]
pub struct NewDocumentRecord {
    pub title: String,
    pub content: String,
    pub owner: UserId,
    pub shared_with: Vec<ShareEntry>,
    pub visibility: Visibility,
    pub link_token: Option<LinkToken>,
    pub tags: BTreeSet<TagId>,
    pub is_starred: bool,
}

/// An explicit whitelist of updatable fields.
///
/// Anything absent stays untouched; owner, identifier, and timestamps are
/// unreachable through a patch. Visibility and the link token travel
/// together so the link/token invariant cannot be broken halfway.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<(Visibility, Option<LinkToken>)>,
    pub tags: Option<BTreeSet<TagId>>,
    pub is_starred: Option<bool>,
    pub shared_with: Option<Vec<ShareEntry>>,
}

impl DocumentPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.visibility.is_none()
            && self.tags.is_none()
            && self.is_starred.is_none()
            && self.shared_with.is_none()
    }
}

/// Result of a conditional or share-level update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The mutation was applied; carries the record as persisted.
    Applied(Document),
    /// The expected version did not match: a concurrent writer got there
    /// first and the caller must reload before retrying.
    Stale,
    /// No such document.
    Missing,
}

/// The document store: async interface for document persistence.
///
/// # Design Notes
///
/// - **Token uniqueness**: inserting or patching in a link token that
///   another document holds returns [`crate::StoreError::Conflict`];
///   callers retry with fresh randomness.
/// - **Conditional updates**: [`DocumentStore::update`] applies only when
///   `expected_version` matches, and bumps the version on success.
/// - **Share atomicity**: [`DocumentStore::add_share`] and
///   [`DocumentStore::remove_share`] are single-entry atomic operations so
///   concurrent grants for different users never lose updates.
/// - **Delete scoping**: [`DocumentStore::delete`] only matches documents
///   the given owner holds; absence and foreign ownership are
///   indistinguishable in the result.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return the stored record.
    async fn insert(&self, record: NewDocumentRecord) -> Result<Document>;

    /// Fetch a document by identifier.
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>>;

    /// Resolve a document by link token. Matches only documents whose
    /// visibility is currently Link.
    async fn find_by_link_token(&self, token: &LinkToken) -> Result<Option<Document>>;

    /// Fetch one page of documents matching `filter`, ordered by `sort`
    /// (with the identifier tiebreak), skipping `skip` and returning at
    /// most `limit` records.
    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>>;

    /// Count documents matching `filter`.
    async fn count(&self, filter: &DocumentFilter) -> Result<u64>;

    /// Apply a whitelisted patch if the stored version equals
    /// `expected_version`. Bumps the version and `updated_at` on success.
    async fn update(
        &self,
        id: &DocumentId,
        expected_version: u64,
        patch: DocumentPatch,
    ) -> Result<UpdateOutcome>;

    /// Atomically upsert one share entry, keyed by user.
    async fn add_share(&self, id: &DocumentId, entry: ShareEntry) -> Result<UpdateOutcome>;

    /// Atomically remove the share entry for `user`, if any. Removing an
    /// absent entry still reports `Applied`: revocation is idempotent.
    async fn remove_share(&self, id: &DocumentId, user: &UserId) -> Result<UpdateOutcome>;

    /// Delete the document if `owner` owns it. Returns whether a record
    /// was deleted.
    async fn delete(&self, id: &DocumentId, owner: &UserId) -> Result<bool>;
}

/// The tag store: global get-or-create tag records.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Look up a tag by its normalized name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Create a tag with the given normalized name. Returns
    /// [`crate::StoreError::Conflict`] if the name is already taken; the
    /// resolver retries the lookup so concurrent first uses converge.
    async fn create(&self, name: &str) -> Result<Tag>;

    /// Fetch a tag by identifier.
    async fn get(&self, id: &TagId) -> Result<Option<Tag>>;
}

/// Validate a share entry set against `owner` before it reaches a store.
///
/// Used by callers that accept whole replacement share sets from the
/// request layer.
pub fn check_share_entries(entries: &[ShareEntry], owner: &UserId) -> Result<()> {
    let mut seen: BTreeSet<UserId> = BTreeSet::new();
    for entry in entries {
        if entry.user == *owner {
            return Err(crate::StoreError::InvalidData(
                "share set must not contain the owner".into(),
            ));
        }
        if !seen.insert(entry.user) {
            return Err(crate::StoreError::InvalidData(format!(
                "duplicate share entry for user {}",
                entry.user
            )));
        }
    }
    Ok(())
}

/// Narrow a permission string from storage.
pub(crate) fn permission_from_column(s: &str) -> Result<Permission> {
    s.parse()
        .map_err(|_| crate::StoreError::InvalidData(format!("unknown permission: {s}")))
}

/// Narrow a visibility string from storage.
pub(crate) fn visibility_from_column(s: &str) -> Result<Visibility> {
    s.parse()
        .map_err(|_| crate::StoreError::InvalidData(format!("unknown visibility: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_is_empty() {
        assert!(DocumentPatch::default().is_empty());

        let patch = DocumentPatch {
            title: Some("t".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_check_share_entries() {
        let owner = UserId::from_bytes([1; 16]);
        let user = UserId::from_bytes([2; 16]);

        check_share_entries(&[], &owner).unwrap();
        check_share_entries(&[ShareEntry::new(user, Permission::Read)], &owner).unwrap();

        assert!(check_share_entries(&[ShareEntry::new(owner, Permission::Read)], &owner).is_err());
        assert!(check_share_entries(
            &[
                ShareEntry::new(user, Permission::Read),
                ShareEntry::new(user, Permission::Edit),
            ],
            &owner
        )
        .is_err());
    }
}
