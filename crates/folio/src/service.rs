//! The document service: request-level operations over the kernel.
//!
//! Every operation is a thin adapter: load the record, ask the
//! access-control engine, apply the registry/state-machine/resolver
//! mutation, persist. The service holds no state of its own beyond the
//! store handles; it is invoked per request.

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_core::{
    Document, DocumentId, LinkToken, Permission, ShareEntry, UserId, Visibility,
};
use folio_perms::{
    access::{decide, is_owner, Action},
    share::{grant, revoke, GrantOutcome, RevokeOutcome},
    visibility::{apply_visibility, disable_token, regenerate_token, TokenEffect},
};
use folio_query::{ListOptions, Page, QueryPlanner};
use folio_store::{
    check_share_entries, DocumentPatch, DocumentStore, NewDocumentRecord, StoreError, TagStore,
    UpdateOutcome,
};

use crate::error::{Result, ServiceError};
use crate::tags::TagResolver;

/// Configuration for the document service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How many times a colliding link token is regenerated before the
    /// collision surfaces as a conflict.
    pub token_retry_limit: u32,
    /// Upper bound on the listing page size.
    pub max_page_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            token_retry_limit: 3,
            max_page_size: 100,
        }
    }
}

/// Input for creating a document.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    /// Tag names; resolved (and created on first use) at creation time.
    pub tags: Vec<String>,
    pub is_starred: bool,
}

impl NewDocument {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A partial update. Absent fields stay untouched; each present field is
/// authorized and validated individually, so a request can never reach the
/// owner, the identifier, the raw token, or the timestamps.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Routed through the visibility state machine, never applied raw.
    pub visibility: Option<Visibility>,
    /// Whole-set replacement of the grants.
    pub shared_with: Option<Vec<ShareEntry>>,
    /// Whole-set replacement of the tags, by name.
    pub tags: Option<Vec<String>>,
    pub is_starred: Option<bool>,
}

/// A full replacement of every caller-editable field.
#[derive(Debug, Clone)]
pub struct DocumentReplace {
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub shared_with: Vec<ShareEntry>,
    pub tags: Vec<String>,
    pub is_starred: bool,
}

/// The unified kernel API for document ownership, sharing, visibility, and
/// listing.
pub struct DocumentService<D: DocumentStore, T: TagStore> {
    documents: Arc<D>,
    tags: TagResolver<T>,
    planner: QueryPlanner,
    config: ServiceConfig,
}

impl<D: DocumentStore, T: TagStore> DocumentService<D, T> {
    /// Create a new service over the given stores.
    pub fn new(documents: Arc<D>, tags: Arc<T>, config: ServiceConfig) -> Self {
        let planner = QueryPlanner::new(config.max_page_size);
        Self {
            documents,
            tags: TagResolver::new(tags),
            planner,
            config,
        }
    }

    /// The document store handle.
    pub fn store(&self) -> &D {
        &self.documents
    }

    /// The tag resolver.
    pub fn tag_resolver(&self) -> &TagResolver<T> {
        &self.tags
    }

    // ─────────────────────────────────────────────────────────────────────
    // Creation / retrieval
    // ─────────────────────────────────────────────────────────────────────

    /// Create a document owned by `owner`.
    ///
    /// A Link visibility request receives a fresh token; a store-level
    /// token collision is retried with new randomness.
    pub async fn create_document(&self, owner: UserId, new: NewDocument) -> Result<Document> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("title must be non-empty".into()));
        }
        let tags = self.tags.resolve(&new.tags).await?;

        let mut attempts = 0;
        loop {
            let link_token = (new.visibility == Visibility::Link).then(LinkToken::generate);
            let record = NewDocumentRecord {
                title: new.title.clone(),
                content: new.content.clone(),
                owner,
                shared_with: Vec::new(),
                visibility: new.visibility,
                link_token,
                tags: tags.clone(),
                is_starred: new.is_starred,
            };

            match self.documents.insert(record).await {
                Ok(doc) => {
                    tracing::debug!(id = %doc.id, owner = %owner, "document created");
                    return Ok(doc);
                }
                Err(StoreError::Conflict(msg)) => {
                    if new.visibility == Visibility::Link
                        && attempts < self.config.token_retry_limit
                    {
                        attempts += 1;
                        tracing::warn!(attempt = attempts, "link token collision, regenerating");
                        continue;
                    }
                    return Err(ServiceError::Conflict(msg));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch a document the actor may read.
    ///
    /// Absence and denial are indistinguishable: both are `NotFound`.
    pub async fn get_document(&self, actor: &UserId, id: &DocumentId) -> Result<Document> {
        let doc = self
            .documents
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !decide(&doc, actor, Action::Read).is_allow() {
            return Err(ServiceError::NotFound);
        }
        Ok(doc)
    }

    /// Resolve a document by its rendered link token.
    ///
    /// A malformed token, an unknown token, and a document that has since
    /// left Link visibility all yield `NotFound`.
    pub async fn get_by_link_token(&self, token: &str) -> Result<Document> {
        let token = LinkToken::from_hex(token).map_err(|_| ServiceError::NotFound)?;
        self.documents
            .find_by_link_token(&token)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a partial update, authorizing each present field.
    pub async fn update_document(
        &self,
        actor: &UserId,
        id: &DocumentId,
        update: DocumentUpdate,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;

        if update.title.is_some() || update.content.is_some() {
            self.ensure(&doc, actor, Action::EditContent)?;
        }
        if update.visibility.is_some() {
            self.ensure(&doc, actor, Action::ManageVisibility)?;
        }
        if let Some(entries) = &update.shared_with {
            self.ensure(&doc, actor, Action::ManageSharing)?;
            check_share_entries(entries, &doc.owner)?;
        }
        if (update.tags.is_some() || update.is_starred.is_some()) && !is_owner(&doc, actor) {
            return Err(ServiceError::Unauthorized);
        }

        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(ServiceError::InvalidInput("title must be non-empty".into()));
            }
        }

        let mut token_generated = false;
        let visibility = match update.visibility {
            Some(next) => {
                let mut working = doc.clone();
                let effect = apply_visibility(&mut working, next);
                token_generated = effect == TokenEffect::Generated;
                Some((working.visibility, working.link_token))
            }
            None => None,
        };

        let tags = match &update.tags {
            Some(names) => Some(self.tags.resolve(names).await?),
            None => None,
        };

        let patch = DocumentPatch {
            title: update.title,
            content: update.content,
            visibility,
            tags,
            is_starred: update.is_starred,
            shared_with: update.shared_with,
        };
        self.persist_patch(id, doc.version, patch, token_generated)
            .await
    }

    /// Replace every caller-editable field at once. Owner-only, since it
    /// rewrites the grants and the visibility alongside the content.
    pub async fn replace_document(
        &self,
        actor: &UserId,
        id: &DocumentId,
        replace: DocumentReplace,
    ) -> Result<Document> {
        self.update_document(
            actor,
            id,
            DocumentUpdate {
                title: Some(replace.title),
                content: Some(replace.content),
                visibility: Some(replace.visibility),
                shared_with: Some(replace.shared_with),
                tags: Some(replace.tags),
                is_starred: Some(replace.is_starred),
            },
        )
        .await
    }

    /// Delete a document the actor owns. Absence and foreign ownership are
    /// indistinguishable.
    pub async fn delete_document(&self, actor: &UserId, id: &DocumentId) -> Result<()> {
        if self.documents.delete(id, actor).await? {
            tracing::debug!(id = %id, "document deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sharing
    // ─────────────────────────────────────────────────────────────────────

    /// Grant `permission` on the document to `target`.
    ///
    /// Granting an identical permission twice is a no-op; a different
    /// permission overwrites the previous grant.
    pub async fn share_document(
        &self,
        actor: &UserId,
        id: &DocumentId,
        target: UserId,
        permission: Permission,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure(&doc, actor, Action::ManageSharing)?;

        let mut working = doc.clone();
        match grant(&mut working, target, permission)? {
            GrantOutcome::Unchanged => Ok(doc),
            GrantOutcome::Inserted | GrantOutcome::Updated => {
                let entry = ShareEntry::new(target, permission);
                match self.documents.add_share(id, entry).await? {
                    UpdateOutcome::Applied(updated) => Ok(updated),
                    UpdateOutcome::Missing => Err(ServiceError::NotFound),
                    UpdateOutcome::Stale => {
                        Err(ServiceError::Conflict("concurrent share update".into()))
                    }
                }
            }
        }
    }

    /// Revoke any grant held by `target`. Revoking a non-member is a
    /// successful no-op.
    pub async fn unshare_document(
        &self,
        actor: &UserId,
        id: &DocumentId,
        target: &UserId,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure(&doc, actor, Action::ManageSharing)?;

        let mut working = doc.clone();
        match revoke(&mut working, target) {
            RevokeOutcome::Absent => Ok(doc),
            RevokeOutcome::Removed => match self.documents.remove_share(id, target).await? {
                UpdateOutcome::Applied(updated) => Ok(updated),
                UpdateOutcome::Missing => Err(ServiceError::NotFound),
                UpdateOutcome::Stale => {
                    Err(ServiceError::Conflict("concurrent share update".into()))
                }
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Visibility and the link token
    // ─────────────────────────────────────────────────────────────────────

    /// Change the document's visibility through the state machine.
    pub async fn set_visibility(
        &self,
        actor: &UserId,
        id: &DocumentId,
        next: Visibility,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure(&doc, actor, Action::ManageVisibility)?;

        let mut working = doc.clone();
        let effect = apply_visibility(&mut working, next);
        let patch = DocumentPatch {
            visibility: Some((working.visibility, working.link_token)),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, effect == TokenEffect::Generated)
            .await
    }

    /// Replace the link token with a fresh value, invalidating the old one
    /// immediately. Fails with `InvalidState` outside Link visibility.
    pub async fn regenerate_link_token(
        &self,
        actor: &UserId,
        id: &DocumentId,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure(&doc, actor, Action::ManageVisibility)?;

        let mut working = doc.clone();
        regenerate_token(&mut working)?;
        let patch = DocumentPatch {
            visibility: Some((working.visibility, working.link_token)),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, true).await
    }

    /// Clear the token and force the document private in one mutation.
    /// Fails with `InvalidState` outside Link visibility.
    pub async fn disable_link_token(
        &self,
        actor: &UserId,
        id: &DocumentId,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure(&doc, actor, Action::ManageVisibility)?;

        let mut working = doc.clone();
        disable_token(&mut working)?;
        let patch = DocumentPatch {
            visibility: Some((Visibility::Private, None)),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, false).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags and the star flag
    // ─────────────────────────────────────────────────────────────────────

    /// Union the resolved identities of `names` into the document's tags.
    /// Owner-scoped; unknown names create tags on first use.
    pub async fn add_tags(
        &self,
        actor: &UserId,
        id: &DocumentId,
        names: &[String],
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure_owner(&doc, actor)?;

        let resolved = self.tags.resolve(names).await?;
        let merged: BTreeSet<_> = doc.tags.union(&resolved).copied().collect();
        if merged == doc.tags {
            return Ok(doc);
        }

        let patch = DocumentPatch {
            tags: Some(merged),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, false).await
    }

    /// Subtract the identities of `names` from the document's tags,
    /// ignoring names that resolve to nothing. Owner-scoped.
    pub async fn remove_tags(
        &self,
        actor: &UserId,
        id: &DocumentId,
        names: &[String],
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure_owner(&doc, actor)?;

        let resolved = self.tags.resolve_existing(names).await?;
        let remaining: BTreeSet<_> = doc.tags.difference(&resolved).copied().collect();
        if remaining == doc.tags {
            return Ok(doc);
        }

        let patch = DocumentPatch {
            tags: Some(remaining),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, false).await
    }

    /// Set the owner-scoped star flag.
    pub async fn set_starred(
        &self,
        actor: &UserId,
        id: &DocumentId,
        starred: bool,
    ) -> Result<Document> {
        let doc = self.load_for_mutation(id).await?;
        self.ensure_owner(&doc, actor)?;

        if doc.is_starred == starred {
            return Ok(doc);
        }
        let patch = DocumentPatch {
            is_starred: Some(starred),
            ..Default::default()
        };
        self.persist_patch(id, doc.version, patch, false).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Listing
    // ─────────────────────────────────────────────────────────────────────

    /// List the documents the actor may enumerate, narrowed and paginated
    /// per `opts`.
    pub async fn list_documents(&self, actor: &UserId, opts: &ListOptions) -> Result<Page> {
        let tag_filter = match opts.tag_names() {
            Some(names) => Some(self.tags.resolve_existing(&names).await?),
            None => None,
        };
        Ok(self
            .planner
            .list(self.documents.as_ref(), actor, opts, tag_filter)
            .await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    async fn load_for_mutation(&self, id: &DocumentId) -> Result<Document> {
        self.documents
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    fn ensure(&self, doc: &Document, actor: &UserId, action: Action) -> Result<()> {
        if decide(doc, actor, action).is_allow() {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    fn ensure_owner(&self, doc: &Document, actor: &UserId) -> Result<()> {
        if is_owner(doc, actor) {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    /// Persist a conditional patch. When the patch carries a freshly
    /// generated token, a uniqueness collision is retried with new
    /// randomness before surfacing as a conflict.
    async fn persist_patch(
        &self,
        id: &DocumentId,
        expected_version: u64,
        mut patch: DocumentPatch,
        retry_token_on_conflict: bool,
    ) -> Result<Document> {
        let mut attempts = 0;
        loop {
            match self
                .documents
                .update(id, expected_version, patch.clone())
                .await
            {
                Ok(UpdateOutcome::Applied(doc)) => return Ok(doc),
                Ok(UpdateOutcome::Stale) => {
                    return Err(ServiceError::Conflict(
                        "document was modified concurrently".into(),
                    ));
                }
                Ok(UpdateOutcome::Missing) => return Err(ServiceError::NotFound),
                Err(StoreError::Conflict(msg)) => {
                    if retry_token_on_conflict && attempts < self.config.token_retry_limit {
                        attempts += 1;
                        tracing::warn!(attempt = attempts, "link token collision, regenerating");
                        if let Some((_, token)) = &mut patch.visibility {
                            if token.is_some() {
                                *token = Some(LinkToken::generate());
                            }
                        }
                        continue;
                    }
                    return Err(ServiceError::Conflict(msg));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
