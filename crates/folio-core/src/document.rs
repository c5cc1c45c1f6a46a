//! The document record and its enumerations.
//!
//! A document is owned by exactly one user for its whole lifetime. Sharing,
//! visibility, tags, and the star flag all mutate under owner action; title
//! and content additionally mutate under any edit-grantee.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::CoreError;
use crate::token::LinkToken;
use crate::types::{DocumentId, TagId, UserId};

/// Document-level access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Owner and explicit grantees only.
    Private,
    /// Any authenticated reader.
    Public,
    /// Any holder of the secret link token.
    Link,
}

impl Visibility {
    /// Wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
            Visibility::Link => "link",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "link" => Ok(Visibility::Link),
            other => Err(CoreError::UnknownVisibility(other.to_string())),
        }
    }
}

/// Permission attached to a grantee, never to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Edit,
}

impl Permission {
    /// Wire name of this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Edit => "edit",
        }
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Permission::Read),
            "edit" => Ok(Permission::Edit),
            other => Err(CoreError::UnknownPermission(other.to_string())),
        }
    }
}

/// One grant on a document: a user and the permission they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub user: UserId,
    pub permission: Permission,
}

impl ShareEntry {
    pub fn new(user: UserId, permission: Permission) -> Self {
        Self { user, permission }
    }
}

/// A document record.
///
/// Invariants (checked by [`crate::validation::validate_document`]):
/// - `title` is non-empty after trimming
/// - `link_token` is present iff `visibility == Link`
/// - `shared_with` holds at most one entry per user and never the owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Serialized rich-text payload. Opaque to the core except that text
    /// search treats it as a haystack.
    pub content: String,
    pub owner: UserId,
    pub shared_with: Vec<ShareEntry>,
    pub visibility: Visibility,
    pub link_token: Option<LinkToken>,
    pub tags: BTreeSet<TagId>,
    pub is_starred: bool,
    /// Optimistic-concurrency counter, bumped by the store on every
    /// successful conditional update.
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    /// Permission held by `user` through an explicit grant, if any.
    ///
    /// Membership is decided by identifier value only. The owner holds no
    /// grant; their access is implicit and total.
    pub fn permission_for(&self, user: &UserId) -> Option<Permission> {
        self.shared_with
            .iter()
            .find(|entry| entry.user == *user)
            .map(|entry| entry.permission)
    }

    /// Whether `user` appears in the share set with any permission.
    pub fn is_shared_with(&self, user: &UserId) -> bool {
        self.permission_for(user).is_some()
    }
}
