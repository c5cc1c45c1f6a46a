//! Filter and sort inputs for document queries.
//!
//! A [`DocumentFilter`] is the compiled form of a list request: the access
//! scope plus the optional search, tag, and star constraints, conjoined.
//! The memory store evaluates [`DocumentFilter::matches`] directly; the
//! SQLite store compiles the same structure to SQL. Both must agree.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use folio_core::{Document, TagId, UserId};

/// The access predicate of a listing: which documents an actor may
/// enumerate at all.
///
/// Note that public documents are NOT enumerable by strangers; listing is
/// scoped to ownership and explicit grants. Public visibility only widens
/// per-document read access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Documents the actor owns.
    Owned(UserId),
    /// Documents shared with the actor and not owned by them.
    SharedWith(UserId),
    /// The union of the above.
    OwnedOrShared(UserId),
}

impl AccessScope {
    /// Evaluate the scope against a single document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            AccessScope::Owned(user) => doc.owner == *user,
            AccessScope::SharedWith(user) => doc.owner != *user && doc.is_shared_with(user),
            AccessScope::OwnedOrShared(user) => doc.owner == *user || doc.is_shared_with(user),
        }
    }
}

/// A fully compiled document filter. All constraints are conjoined.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub scope: AccessScope,
    /// Case-insensitive substring matched against title and content.
    pub search: Option<String>,
    /// Match-any tag constraint. `Some` with an empty set matches nothing:
    /// the caller asked for tags that resolve to no known identity.
    pub tags: Option<BTreeSet<TagId>>,
    /// When true, only starred documents match.
    pub starred_only: bool,
}

impl DocumentFilter {
    /// A filter with only the access scope set.
    pub fn scoped(scope: AccessScope) -> Self {
        Self {
            scope,
            search: None,
            tags: None,
            starred_only: false,
        }
    }

    /// Evaluate the filter against a single document.
    pub fn matches(&self, doc: &Document) -> bool {
        if !self.scope.matches(doc) {
            return false;
        }

        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            if !doc.title.to_lowercase().contains(&needle)
                && !doc.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(tags) = &self.tags {
            if !tags.iter().any(|t| doc.tags.contains(t)) {
                return false;
            }
        }

        if self.starred_only && !doc.is_starred {
            return false;
        }

        true
    }
}

/// Sortable document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A sort specification. Every store applies the identifier tiebreak after
/// the primary key so pagination stays stable under duplicate key values.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    /// Total order over documents: primary key in the requested direction,
    /// then identifier ascending.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.cmp(&b.title),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
