//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use folio_core::{
    validate_document, Document, DocumentId, LinkToken, ShareEntry, Tag, TagId, UserId,
};

use crate::error::{Result, StoreError};
use crate::filter::{DocumentFilter, SortSpec};
use crate::traits::{
    check_share_entries, DocumentPatch, DocumentStore, NewDocumentRecord, TagStore, UpdateOutcome,
};

/// In-memory store implementing both [`DocumentStore`] and [`TagStore`].
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Documents indexed by ID.
    documents: HashMap<DocumentId, Document>,

    /// Token index: enforces global token uniqueness and backs link lookup.
    tokens: HashMap<LinkToken, DocumentId>,

    /// Tags indexed by ID.
    tags: HashMap<TagId, Tag>,

    /// Name index: enforces tag-name uniqueness.
    tag_names: HashMap<String, TagId>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    /// Check that `token` is not held by any document other than `holder`.
    fn check_token_free(&self, token: &LinkToken, holder: Option<&DocumentId>) -> Result<()> {
        match self.tokens.get(token) {
            Some(existing) if Some(existing) != holder => Err(StoreError::Conflict(
                "link token already in use".into(),
            )),
            _ => Ok(()),
        }
    }

    fn apply_patch(doc: &mut Document, patch: DocumentPatch) {
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(content) = patch.content {
            doc.content = content;
        }
        if let Some((visibility, token)) = patch.visibility {
            doc.visibility = visibility;
            doc.link_token = token;
        }
        if let Some(tags) = patch.tags {
            doc.tags = tags;
        }
        if let Some(is_starred) = patch.is_starred {
            doc.is_starred = is_starred;
        }
        if let Some(shared_with) = patch.shared_with {
            doc.shared_with = shared_with;
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, record: NewDocumentRecord) -> Result<Document> {
        let mut inner = self.write()?;

        if let Some(token) = &record.link_token {
            inner.check_token_free(token, None)?;
        }
        check_share_entries(&record.shared_with, &record.owner)?;

        let mut id = DocumentId::generate();
        while inner.documents.contains_key(&id) {
            id = DocumentId::generate();
        }

        let now = now_millis();
        let doc = Document {
            id,
            title: record.title,
            content: record.content,
            owner: record.owner,
            shared_with: record.shared_with,
            visibility: record.visibility,
            link_token: record.link_token,
            tags: record.tags,
            is_starred: record.is_starred,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        validate_document(&doc).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        if let Some(token) = doc.link_token {
            inner.tokens.insert(token, id);
        }
        inner.documents.insert(id, doc.clone());
        Ok(doc)
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<Document>> {
        let inner = self.read()?;
        Ok(inner.documents.get(id).cloned())
    }

    async fn find_by_link_token(&self, token: &LinkToken) -> Result<Option<Document>> {
        let inner = self.read()?;
        Ok(inner
            .tokens
            .get(token)
            .and_then(|id| inner.documents.get(id))
            .filter(|doc| doc.visibility == folio_core::Visibility::Link)
            .cloned())
    }

    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>> {
        let inner = self.read()?;

        let mut matching: Vec<Document> = inner
            .documents
            .values()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        Ok(matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner
            .documents
            .values()
            .filter(|doc| filter.matches(doc))
            .count() as u64)
    }

    async fn update(
        &self,
        id: &DocumentId,
        expected_version: u64,
        patch: DocumentPatch,
    ) -> Result<UpdateOutcome> {
        let mut inner = self.write()?;

        let Some(current) = inner.documents.get(id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if current.version != expected_version {
            return Ok(UpdateOutcome::Stale);
        }

        if let Some((_, Some(token))) = &patch.visibility {
            inner.check_token_free(token, Some(id))?;
        }
        if let Some(entries) = &patch.shared_with {
            check_share_entries(entries, &current.owner)?;
        }

        let old_token = current.link_token;
        let mut doc = current.clone();
        MemoryStoreInner::apply_patch(&mut doc, patch);
        doc.version += 1;
        doc.updated_at = now_millis();
        validate_document(&doc).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        if old_token != doc.link_token {
            if let Some(token) = old_token {
                inner.tokens.remove(&token);
            }
            if let Some(token) = doc.link_token {
                inner.tokens.insert(token, *id);
            }
        }
        inner.documents.insert(*id, doc.clone());
        Ok(UpdateOutcome::Applied(doc))
    }

    async fn add_share(&self, id: &DocumentId, entry: ShareEntry) -> Result<UpdateOutcome> {
        let mut inner = self.write()?;

        let Some(doc) = inner.documents.get_mut(id) else {
            return Ok(UpdateOutcome::Missing);
        };

        match doc.shared_with.iter_mut().find(|e| e.user == entry.user) {
            Some(existing) => existing.permission = entry.permission,
            None => doc.shared_with.push(entry),
        }
        doc.version += 1;
        doc.updated_at = now_millis();
        Ok(UpdateOutcome::Applied(doc.clone()))
    }

    async fn remove_share(&self, id: &DocumentId, user: &UserId) -> Result<UpdateOutcome> {
        let mut inner = self.write()?;

        let Some(doc) = inner.documents.get_mut(id) else {
            return Ok(UpdateOutcome::Missing);
        };

        let before = doc.shared_with.len();
        doc.shared_with.retain(|e| e.user != *user);
        if doc.shared_with.len() < before {
            doc.version += 1;
            doc.updated_at = now_millis();
        }
        Ok(UpdateOutcome::Applied(doc.clone()))
    }

    async fn delete(&self, id: &DocumentId, owner: &UserId) -> Result<bool> {
        let mut inner = self.write()?;

        match inner.documents.get(id) {
            Some(doc) if doc.owner == *owner => {
                if let Some(token) = inner.documents.remove(id).and_then(|d| d.link_token) {
                    inner.tokens.remove(&token);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let inner = self.read()?;
        Ok(inner
            .tag_names
            .get(name)
            .and_then(|id| inner.tags.get(id))
            .cloned())
    }

    async fn create(&self, name: &str) -> Result<Tag> {
        let mut inner = self.write()?;

        if inner.tag_names.contains_key(name) {
            return Err(StoreError::Conflict(format!(
                "tag name already exists: {name}"
            )));
        }

        let mut id = TagId::generate();
        while inner.tags.contains_key(&id) {
            id = TagId::generate();
        }
        let tag = Tag {
            id,
            name: name.to_string(),
        };
        inner.tag_names.insert(tag.name.clone(), id);
        inner.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn get(&self, id: &TagId) -> Result<Option<Tag>> {
        let inner = self.read()?;
        Ok(inner.tags.get(id).cloned())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AccessScope, SortField, SortOrder};
    use folio_core::{Permission, Visibility};
    use std::collections::BTreeSet;

    fn record(owner: UserId, title: &str) -> NewDocumentRecord {
        NewDocumentRecord {
            title: title.into(),
            content: String::new(),
            owner,
            shared_with: Vec::new(),
            visibility: Visibility::Private,
            link_token: None,
            tags: BTreeSet::new(),
            is_starred: false,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_version_and_timestamps() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);

        let doc = store.insert(record(owner, "notes")).await.unwrap();
        assert_eq!(doc.version, 1);
        assert!(doc.created_at > 0);
        assert_eq!(doc.created_at, doc.updated_at);

        let loaded = DocumentStore::get(&store, &doc.id).await.unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_token() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let token = LinkToken::generate();

        let mut first = record(owner, "a");
        first.visibility = Visibility::Link;
        first.link_token = Some(token);
        store.insert(first).await.unwrap();

        let mut second = record(owner, "b");
        second.visibility = Visibility::Link;
        second.link_token = Some(token);
        assert!(matches!(
            store.insert(second).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_token_requires_link_visibility() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let token = LinkToken::generate();

        let mut rec = record(owner, "a");
        rec.visibility = Visibility::Link;
        rec.link_token = Some(token);
        let doc = store.insert(rec).await.unwrap();

        assert!(store.find_by_link_token(&token).await.unwrap().is_some());

        // Leaving link visibility makes the token dead even if a stale
        // index entry survived.
        let patch = DocumentPatch {
            visibility: Some((Visibility::Private, None)),
            ..Default::default()
        };
        store.update(&doc.id, doc.version, patch).await.unwrap();
        assert!(store.find_by_link_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_is_version_gated() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        let patch = DocumentPatch {
            title: Some("b".into()),
            ..Default::default()
        };
        let outcome = store.update(&doc.id, doc.version, patch.clone()).await.unwrap();
        let updated = match outcome {
            UpdateOutcome::Applied(d) => d,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.title, "b");
        assert_eq!(updated.version, doc.version + 1);

        // The first writer's version is now stale.
        let stale = store.update(&doc.id, doc.version, patch).await.unwrap();
        assert_eq!(stale, UpdateOutcome::Stale);

        let missing = store
            .update(&DocumentId::generate(), 1, DocumentPatch::default())
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome::Missing);
    }

    #[tokio::test]
    async fn test_add_share_upserts_by_user() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let user = UserId::from_bytes([2; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        store
            .add_share(&doc.id, ShareEntry::new(user, Permission::Read))
            .await
            .unwrap();
        let outcome = store
            .add_share(&doc.id, ShareEntry::new(user, Permission::Edit))
            .await
            .unwrap();

        let updated = match outcome {
            UpdateOutcome::Applied(d) => d,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.shared_with.len(), 1);
        assert_eq!(updated.permission_for(&user), Some(Permission::Edit));
    }

    #[tokio::test]
    async fn test_remove_share_is_idempotent() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let user = UserId::from_bytes([2; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        let outcome = store.remove_share(&doc.id, &user).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Applied(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);
        let stranger = UserId::from_bytes([2; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        assert!(!store.delete(&doc.id, &stranger).await.unwrap());
        assert!(store.delete(&doc.id, &owner).await.unwrap());
        assert!(DocumentStore::get(&store, &doc.id).await.unwrap().is_none());
        // Idempotent from the caller's perspective: already gone.
        assert!(!store.delete(&doc.id, &owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_pagination_is_stable_under_equal_keys() {
        let store = MemoryStore::new();
        let owner = UserId::from_bytes([1; 16]);

        for i in 0..5 {
            store.insert(record(owner, &format!("doc {i}"))).await.unwrap();
        }

        let filter = DocumentFilter::scoped(AccessScope::Owned(owner));
        let sort = SortSpec {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        };

        let all = store.find_page(&filter, &sort, 0, 10).await.unwrap();
        let page1 = store.find_page(&filter, &sort, 0, 2).await.unwrap();
        let page2 = store.find_page(&filter, &sort, 2, 2).await.unwrap();
        let page3 = store.find_page(&filter, &sort, 4, 2).await.unwrap();

        let paged: Vec<_> = page1.into_iter().chain(page2).chain(page3).collect();
        assert_eq!(paged, all);
        assert_eq!(store.count(&filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_tag_create_conflicts_on_duplicate_name() {
        let store = MemoryStore::new();

        let tag = store.create("work").await.unwrap();
        assert!(matches!(
            store.create("work").await,
            Err(StoreError::Conflict(_))
        ));

        let found = store.find_by_name("work").await.unwrap().unwrap();
        assert_eq!(found.id, tag.id);
        assert_eq!(TagStore::get(&store, &tag.id).await.unwrap().unwrap().name, "work");
    }
}
