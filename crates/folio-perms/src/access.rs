//! The access-control engine: a pure predicate over documents and actors.
//!
//! Given a document, an actor, and a requested action, [`decide`] returns
//! allow or deny. It has no side effects and never errors; callers translate
//! a deny into an authorization failure.

use serde::{Deserialize, Serialize};

use folio_core::{Document, Permission, UserId, Visibility};

/// An action an actor may request on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Read the document.
    Read,
    /// Modify title or content.
    EditContent,
    /// Grant or revoke shares.
    ManageSharing,
    /// Change visibility or operate on the link token.
    ManageVisibility,
    /// Destroy the document.
    Delete,
}

/// The outcome of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Whether `actor` owns the document.
///
/// Ownership is fixed at creation and implies every action. Tag and star
/// edits, which have no dedicated [`Action`], are authorized with this
/// check directly.
pub fn is_owner(doc: &Document, actor: &UserId) -> bool {
    doc.owner == *actor
}

/// Decide whether `actor` may perform `action` on `doc`.
///
/// Rules are evaluated in order, first match wins:
/// 1. owner → allow everything
/// 2. read + public visibility → allow
/// 3. read + any grant → allow
/// 4. edit-content + edit grant → allow
/// 5. deny
///
/// ManageSharing, ManageVisibility, and Delete never reach a grantee.
pub fn decide(doc: &Document, actor: &UserId, action: Action) -> Decision {
    if is_owner(doc, actor) {
        return Decision::Allow;
    }

    match action {
        Action::Read => {
            if doc.visibility == Visibility::Public || doc.is_shared_with(actor) {
                return Decision::Allow;
            }
        }
        Action::EditContent => {
            if doc.permission_for(actor) == Some(Permission::Edit) {
                return Decision::Allow;
            }
        }
        Action::ManageSharing | Action::ManageVisibility | Action::Delete => {}
    }

    Decision::Deny
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{DocumentId, LinkToken, ShareEntry};
    use std::collections::BTreeSet;

    fn doc_with(
        visibility: Visibility,
        shared_with: Vec<ShareEntry>,
    ) -> (Document, UserId) {
        let owner = UserId::from_bytes([0xaa; 16]);
        let link_token = (visibility == Visibility::Link).then(LinkToken::generate);
        let doc = Document {
            id: DocumentId::from_bytes([1; 16]),
            title: "draft".into(),
            content: String::new(),
            owner,
            shared_with,
            visibility,
            link_token,
            tags: BTreeSet::new(),
            is_starred: false,
            version: 1,
            created_at: 0,
            updated_at: 0,
        };
        (doc, owner)
    }

    const ALL_ACTIONS: [Action; 5] = [
        Action::Read,
        Action::EditContent,
        Action::ManageSharing,
        Action::ManageVisibility,
        Action::Delete,
    ];

    #[test]
    fn test_owner_allowed_everything() {
        let (doc, owner) = doc_with(Visibility::Private, vec![]);
        for action in ALL_ACTIONS {
            assert!(decide(&doc, &owner, action).is_allow(), "{:?}", action);
        }
    }

    #[test]
    fn test_stranger_denied_everything_private() {
        let (doc, _) = doc_with(Visibility::Private, vec![]);
        let stranger = UserId::from_bytes([0x01; 16]);
        for action in ALL_ACTIONS {
            assert_eq!(decide(&doc, &stranger, action), Decision::Deny);
        }
    }

    #[test]
    fn test_public_grants_read_only() {
        let (doc, _) = doc_with(Visibility::Public, vec![]);
        let stranger = UserId::from_bytes([0x01; 16]);
        assert!(decide(&doc, &stranger, Action::Read).is_allow());
        assert_eq!(decide(&doc, &stranger, Action::EditContent), Decision::Deny);
        assert_eq!(decide(&doc, &stranger, Action::Delete), Decision::Deny);
    }

    #[test]
    fn test_read_grant_allows_read_not_edit() {
        let reader = UserId::from_bytes([0x02; 16]);
        let (doc, _) = doc_with(
            Visibility::Private,
            vec![ShareEntry::new(reader, Permission::Read)],
        );
        assert!(decide(&doc, &reader, Action::Read).is_allow());
        assert_eq!(decide(&doc, &reader, Action::EditContent), Decision::Deny);
    }

    #[test]
    fn test_edit_grant_allows_read_and_edit() {
        let editor = UserId::from_bytes([0x03; 16]);
        let (doc, _) = doc_with(
            Visibility::Private,
            vec![ShareEntry::new(editor, Permission::Edit)],
        );
        assert!(decide(&doc, &editor, Action::Read).is_allow());
        assert!(decide(&doc, &editor, Action::EditContent).is_allow());
    }

    #[test]
    fn test_admin_actions_never_reach_grantees() {
        let editor = UserId::from_bytes([0x03; 16]);
        let (doc, _) = doc_with(
            Visibility::Public,
            vec![ShareEntry::new(editor, Permission::Edit)],
        );
        for action in [Action::ManageSharing, Action::ManageVisibility, Action::Delete] {
            assert_eq!(decide(&doc, &editor, action), Decision::Deny, "{:?}", action);
        }
    }

    #[test]
    fn test_link_visibility_grants_nothing_without_token() {
        // Link visibility is reachable only via the token lookup path; it
        // confers no per-user rights in the decision procedure.
        let (doc, _) = doc_with(Visibility::Link, vec![]);
        let stranger = UserId::from_bytes([0x04; 16]);
        assert_eq!(decide(&doc, &stranger, Action::Read), Decision::Deny);
    }
}
