//! The query planner: compiles a listing request into a store query and
//! assembles the page with its metadata.
//!
//! Planning is pure; execution issues one `count` and one `find_page`
//! against the store. The sort always carries the identifier tiebreak, so
//! walking pages under a duplicate-heavy sort key never skips or repeats a
//! document.

use std::collections::BTreeSet;

use folio_core::{Document, TagId, UserId};
use folio_store::{AccessScope, DocumentFilter, DocumentStore, SortSpec};

use crate::error::{QueryError, Result};
use crate::options::{ListOptions, VisibilityScope};

/// Pagination metadata of a listing response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_docs: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub has_next: bool,
}

/// One page of documents plus its metadata.
#[derive(Debug, Clone)]
pub struct Page {
    pub documents: Vec<Document>,
    pub meta: PageMeta,
}

/// A compiled listing: filter, sort, and pagination window.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub filter: DocumentFilter,
    pub sort: SortSpec,
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

/// Compiles list options into store queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner {
    /// Upper bound on the page size; larger requests are clamped.
    max_limit: u64,
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self { max_limit: 100 }
    }
}

impl QueryPlanner {
    pub fn new(max_limit: u64) -> Self {
        Self { max_limit }
    }

    /// Compile `opts` for `actor` into a [`QueryPlan`].
    ///
    /// `tag_filter` is the resolved form of the options' tag names:
    /// `None` for no constraint, `Some` (possibly empty) for a match-any
    /// constraint. Resolution is the caller's concern since it needs the
    /// tag store.
    pub fn plan(
        &self,
        actor: &UserId,
        opts: &ListOptions,
        tag_filter: Option<BTreeSet<TagId>>,
    ) -> Result<QueryPlan> {
        if opts.page < 1 {
            return Err(QueryError::InvalidPage(opts.page));
        }
        if opts.limit < 1 {
            return Err(QueryError::InvalidLimit(opts.limit));
        }

        let scope = match opts.scope {
            VisibilityScope::Private => AccessScope::Owned(*actor),
            VisibilityScope::Shared => AccessScope::SharedWith(*actor),
            VisibilityScope::All => AccessScope::OwnedOrShared(*actor),
        };

        let filter = DocumentFilter {
            scope,
            search: opts.search_needle(),
            tags: tag_filter,
            starred_only: opts.starred_only,
        };

        let page = opts.page as u64;
        let limit = (opts.limit as u64).min(self.max_limit);

        Ok(QueryPlan {
            filter,
            sort: opts.sort_spec()?,
            page,
            limit,
            skip: (page - 1) * limit,
        })
    }

    /// Plan and execute a listing against `store`.
    pub async fn list<D: DocumentStore>(
        &self,
        store: &D,
        actor: &UserId,
        opts: &ListOptions,
        tag_filter: Option<BTreeSet<TagId>>,
    ) -> Result<Page> {
        let plan = self.plan(actor, opts, tag_filter)?;

        let total_docs = store.count(&plan.filter).await?;
        let documents = store
            .find_page(&plan.filter, &plan.sort, plan.skip, plan.limit)
            .await?;

        let total_pages = total_docs.div_ceil(plan.limit);
        Ok(Page {
            documents,
            meta: PageMeta {
                total_docs,
                total_pages,
                current_page: plan.page,
                has_next: plan.page < total_pages,
            },
        })
    }
}
