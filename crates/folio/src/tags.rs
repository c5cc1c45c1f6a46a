//! The tag resolver: store-backed get-or-create of tag identities.
//!
//! Tag records are global and lazily created on first reference. Creation
//! races between concurrent callers are resolved by the store's uniqueness
//! guarantee on the normalized name: the loser of the race retries the
//! lookup and converges on the winner's identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_core::{normalize_tag_name, TagId};
use folio_store::{StoreError, TagStore};

use crate::error::{Result, ServiceError};

/// Resolves tag names to stable tag identities, creating records on first
/// use.
pub struct TagResolver<T: TagStore> {
    store: Arc<T>,
}

impl<T: TagStore> TagResolver<T> {
    pub fn new(store: Arc<T>) -> Self {
        Self { store }
    }

    /// Resolve `names` to a de-duplicated set of tag identities, creating
    /// missing tags. An un-normalizable name (blank) is `InvalidInput`.
    pub async fn resolve(&self, names: &[String]) -> Result<BTreeSet<TagId>> {
        let mut ids = BTreeSet::new();
        for name in names {
            let normalized = normalize_tag_name(name)?;
            ids.insert(self.get_or_create(&normalized).await?);
        }
        Ok(ids)
    }

    /// Resolve `names` without creating anything, silently dropping names
    /// that are blank or resolve to no known tag.
    pub async fn resolve_existing(&self, names: &[String]) -> Result<BTreeSet<TagId>> {
        let mut ids = BTreeSet::new();
        for name in names {
            let Ok(normalized) = normalize_tag_name(name) else {
                continue;
            };
            if let Some(tag) = self.store.find_by_name(&normalized).await? {
                ids.insert(tag.id);
            }
        }
        Ok(ids)
    }

    async fn get_or_create(&self, name: &str) -> Result<TagId> {
        if let Some(tag) = self.store.find_by_name(name).await? {
            return Ok(tag.id);
        }

        match self.store.create(name).await {
            Ok(tag) => Ok(tag.id),
            Err(StoreError::Conflict(_)) => {
                // Lost the creation race; the winner's record is visible now.
                tracing::debug!(name, "tag creation raced, retrying lookup");
                self.store
                    .find_by_name(name)
                    .await?
                    .map(|tag| tag.id)
                    .ok_or_else(|| {
                        ServiceError::Conflict(format!("tag {name} vanished after conflict"))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::MemoryStore;

    fn resolver() -> TagResolver<MemoryStore> {
        TagResolver::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_case_variants_resolve_to_one_identity() {
        let resolver = resolver();
        let names = vec!["Work".to_string(), "work".to_string(), " WORK ".to_string()];
        let ids = resolver.resolve(&names).await.unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_stable_across_calls() {
        let resolver = resolver();
        let first = resolver.resolve(&["urgent".to_string()]).await.unwrap();
        let second = resolver.resolve(&["Urgent".to_string()]).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_blank_name_is_invalid_input() {
        let resolver = resolver();
        let err = resolver.resolve(&["   ".to_string()]).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_resolve_existing_ignores_unknown_and_blank() {
        let resolver = resolver();
        resolver.resolve(&["work".to_string()]).await.unwrap();

        let ids = resolver
            .resolve_existing(&[
                "work".to_string(),
                "never-created".to_string(),
                "  ".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_converges() {
        let store = Arc::new(MemoryStore::new());
        let a = TagResolver::new(Arc::clone(&store));
        let b = TagResolver::new(store);

        let a_tags = ["shared-tag".to_string()];
        let b_tags = ["Shared-Tag".to_string()];
        let (ra, rb) = tokio::join!(a.resolve(&a_tags), b.resolve(&b_tags));
        assert_eq!(ra.unwrap(), rb.unwrap());
    }
}
