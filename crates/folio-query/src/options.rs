//! List options: the recognized configuration of a listing request.
//!
//! This is the inbound shape the request layer hands to the kernel. Every
//! field has a default so a bare `{}` request lists the first page of
//! everything the actor can see, newest first.

use serde::Deserialize;

use folio_store::{SortField, SortOrder, SortSpec};

use crate::error::QueryError;

/// Which slice of the actor's reachable documents to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityScope {
    /// Owned documents only.
    Private,
    /// Documents shared with the actor and not owned by them.
    Shared,
    /// The union of owned and shared.
    All,
}

impl Default for VisibilityScope {
    fn default() -> Self {
        VisibilityScope::All
    }
}

/// Recognized options of a listing request, with wire-compatible names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOptions {
    /// 1-based page number.
    pub page: i64,
    /// Page size. Values above the planner's maximum are clamped.
    pub limit: i64,
    /// Free-text search over title and content. Blank means no constraint.
    pub search: String,
    /// Wire name of the sort field: `createdAt`, `updatedAt`, or `title`.
    pub sort_by: String,
    /// `asc` sorts ascending; anything else descending.
    pub sort_order: String,
    /// Optional comma-separated tag names, matched with match-any
    /// semantics.
    pub tags: Option<String>,
    /// When true, only starred documents are listed.
    #[serde(rename = "isStarred")]
    pub starred_only: bool,
    /// Access scope of the listing.
    #[serde(rename = "visibilityScope")]
    pub scope: VisibilityScope,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: String::new(),
            sort_by: "createdAt".into(),
            sort_order: "desc".into(),
            tags: None,
            starred_only: false,
            scope: VisibilityScope::All,
        }
    }
}

impl ListOptions {
    /// Parse the sort field and order.
    ///
    /// Unknown sort fields are rejected; an unknown order falls back to
    /// descending, matching the wire contract.
    pub fn sort_spec(&self) -> Result<SortSpec, QueryError> {
        let field = match self.sort_by.as_str() {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "title" => SortField::Title,
            other => return Err(QueryError::UnknownSortField(other.to_string())),
        };
        let order = if self.sort_order == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        Ok(SortSpec { field, order })
    }

    /// The trimmed search needle, if any.
    pub fn search_needle(&self) -> Option<String> {
        let needle = self.search.trim();
        (!needle.is_empty()).then(|| needle.to_string())
    }

    /// The requested tag names, split on commas with blanks dropped.
    ///
    /// Returns `None` when the option is absent or contains no usable
    /// names, meaning no tag constraint at all.
    pub fn tag_names(&self) -> Option<Vec<String>> {
        let names: Vec<String> = self
            .tags
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        (!names.is_empty()).then_some(names)
    }
}
