//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use folio::{Document, DocumentService, NewDocument, ServiceConfig};
use folio_core::UserId;
use folio_store::MemoryStore;

/// A test fixture with a memory-backed document service.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub service: DocumentService<MemoryStore, MemoryStore>,
}

impl TestFixture {
    /// Create a new fixture over a fresh memory store.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a fixture with a custom service configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let service = DocumentService::new(Arc::clone(&store), Arc::clone(&store), config);
        Self { store, service }
    }

    /// A deterministic user identity for test scripts.
    pub fn user(n: u8) -> UserId {
        UserId::from_bytes([n; 16])
    }

    /// Seed `count` plainly-titled documents owned by `owner`.
    pub async fn seed_documents(&self, owner: UserId, count: usize) -> Vec<Document> {
        let mut docs = Vec::with_capacity(count);
        for i in 0..count {
            let doc = self
                .service
                .create_document(owner, NewDocument::titled(format!("document {i:03}")))
                .await
                .expect("seeding failed");
            docs.push(doc);
        }
        docs
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio::ListOptions;

    #[tokio::test]
    async fn test_fixture_seeds_documents() {
        let fixture = TestFixture::new();
        let owner = TestFixture::user(1);

        let docs = fixture.seed_documents(owner, 4).await;
        assert_eq!(docs.len(), 4);

        let page = fixture
            .service
            .list_documents(&owner, &ListOptions::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total_docs, 4);
    }

    #[tokio::test]
    async fn test_fixture_users_are_distinct() {
        assert_ne!(TestFixture::user(1), TestFixture::user(2));
        assert_eq!(TestFixture::user(3), TestFixture::user(3));
    }
}
