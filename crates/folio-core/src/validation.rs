//! Document record validation: the structural invariants every persisted
//! record must satisfy.

use std::collections::BTreeSet;

use crate::document::{Document, Visibility};
use crate::error::ValidationError;
use crate::types::UserId;

/// Validate a document record against the structural invariants.
///
/// This performs:
/// - Title check (non-empty after trimming)
/// - Token/visibility coupling (`link_token` present iff visibility is Link)
/// - Share-set rules (no owner entry, no duplicate users)
pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    // 1. Title must be non-empty
    if doc.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    // 2. Token present iff visibility is Link
    match (doc.visibility, doc.link_token.is_some()) {
        (Visibility::Link, false) => return Err(ValidationError::MissingLinkToken),
        (Visibility::Private | Visibility::Public, true) => {
            return Err(ValidationError::StrayLinkToken(doc.visibility));
        }
        _ => {}
    }

    // 3. Owner never appears in the share set
    if doc.is_shared_with(&doc.owner) {
        return Err(ValidationError::OwnerInShareSet(doc.owner));
    }

    // 4. At most one entry per user
    let mut seen: BTreeSet<UserId> = BTreeSet::new();
    for entry in &doc.shared_with {
        if !seen.insert(entry.user) {
            return Err(ValidationError::DuplicateShareEntry(entry.user));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Permission, ShareEntry};
    use crate::token::LinkToken;
    use crate::types::{DocumentId, UserId};

    fn base_doc() -> Document {
        Document {
            id: DocumentId::from_bytes([1; 16]),
            title: "meeting notes".into(),
            content: String::new(),
            owner: UserId::from_bytes([0xa0; 16]),
            shared_with: Vec::new(),
            visibility: Visibility::Private,
            link_token: None,
            tags: BTreeSet::new(),
            is_starred: false,
            version: 1,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_valid_document_passes() {
        validate_document(&base_doc()).unwrap();
    }

    #[test]
    fn test_rejects_blank_title() {
        let mut doc = base_doc();
        doc.title = "   ".into();
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::EmptyTitle)
        ));
    }

    #[test]
    fn test_link_visibility_requires_token() {
        let mut doc = base_doc();
        doc.visibility = Visibility::Link;
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::MissingLinkToken)
        ));

        doc.link_token = Some(LinkToken::generate());
        validate_document(&doc).unwrap();
    }

    #[test]
    fn test_token_outside_link_visibility_rejected() {
        let mut doc = base_doc();
        doc.link_token = Some(LinkToken::generate());
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::StrayLinkToken(Visibility::Private))
        ));

        doc.visibility = Visibility::Public;
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::StrayLinkToken(Visibility::Public))
        ));
    }

    #[test]
    fn test_owner_in_share_set_rejected() {
        let mut doc = base_doc();
        doc.shared_with
            .push(ShareEntry::new(doc.owner, Permission::Read));
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::OwnerInShareSet(_))
        ));
    }

    #[test]
    fn test_duplicate_share_entry_rejected() {
        let mut doc = base_doc();
        let user = UserId::from_bytes([7; 16]);
        doc.shared_with.push(ShareEntry::new(user, Permission::Read));
        doc.shared_with.push(ShareEntry::new(user, Permission::Edit));
        assert!(matches!(
            validate_document(&doc),
            Err(ValidationError::DuplicateShareEntry(u)) if u == user
        ));
    }
}
