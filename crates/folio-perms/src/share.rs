//! The share registry: grant and revoke operations on a document's share set.
//!
//! These functions mutate the in-memory record only; the caller decides on
//! an outcome-by-outcome basis which store operation persists the change.
//! All membership tests compare user identifiers by value.

use folio_core::{Document, Permission, ShareEntry, UserId};

use crate::error::PermsError;

/// What a grant did to the share set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The user had no entry; one was inserted.
    Inserted,
    /// The user had an entry with a different permission; it was overwritten.
    Updated,
    /// The user already held exactly this permission.
    Unchanged,
}

/// What a revoke did to the share set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The matching entry was removed.
    Removed,
    /// No entry existed; revocation is idempotent and this is not an error.
    Absent,
}

/// Grant `permission` on `doc` to `target`.
///
/// Granting to the owner is rejected: ownership already implies full access,
/// and an owner entry in the share set would violate the record invariants.
pub fn grant(
    doc: &mut Document,
    target: UserId,
    permission: Permission,
) -> Result<GrantOutcome, PermsError> {
    if target == doc.owner {
        return Err(PermsError::SelfShare);
    }

    match doc.shared_with.iter_mut().find(|e| e.user == target) {
        Some(entry) if entry.permission == permission => Ok(GrantOutcome::Unchanged),
        Some(entry) => {
            entry.permission = permission;
            Ok(GrantOutcome::Updated)
        }
        None => {
            doc.shared_with.push(ShareEntry::new(target, permission));
            Ok(GrantOutcome::Inserted)
        }
    }
}

/// Revoke any grant held by `target` on `doc`.
pub fn revoke(doc: &mut Document, target: &UserId) -> RevokeOutcome {
    let before = doc.shared_with.len();
    doc.shared_with.retain(|e| e.user != *target);
    if doc.shared_with.len() < before {
        RevokeOutcome::Removed
    } else {
        RevokeOutcome::Absent
    }
}
