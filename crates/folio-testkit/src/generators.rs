//! Proptest generators for property-based testing.

use proptest::prelude::*;
use std::collections::BTreeSet;

use folio_core::{
    Document, DocumentId, LinkToken, Permission, ShareEntry, TagId, UserId, Visibility,
};

/// Generate a random UserId.
pub fn user_id() -> impl Strategy<Value = UserId> {
    any::<[u8; 16]>().prop_map(UserId::from_bytes)
}

/// Generate a random DocumentId.
pub fn document_id() -> impl Strategy<Value = DocumentId> {
    any::<[u8; 16]>().prop_map(DocumentId::from_bytes)
}

/// Generate a random TagId.
pub fn tag_id() -> impl Strategy<Value = TagId> {
    any::<[u8; 16]>().prop_map(TagId::from_bytes)
}

/// Generate a random LinkToken.
pub fn link_token() -> impl Strategy<Value = LinkToken> {
    any::<[u8; 32]>().prop_map(LinkToken::from_bytes)
}

/// Generate a Permission.
pub fn permission() -> impl Strategy<Value = Permission> {
    prop_oneof![Just(Permission::Read), Just(Permission::Edit)]
}

/// Generate a Visibility.
pub fn visibility() -> impl Strategy<Value = Visibility> {
    prop_oneof![
        Just(Visibility::Private),
        Just(Visibility::Public),
        Just(Visibility::Link),
    ]
}

/// Generate a non-blank document title.
pub fn title() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,24}".prop_map(String::from)
}

/// Generate a normalized tag name.
pub fn tag_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate a set of tag identities.
pub fn tag_set(max: usize) -> impl Strategy<Value = BTreeSet<TagId>> {
    prop::collection::btree_set(tag_id(), 0..=max)
}

/// Generate a share set with unique users, excluding `owner`.
pub fn share_entries(owner: UserId) -> impl Strategy<Value = Vec<ShareEntry>> {
    prop::collection::btree_map(user_id(), permission(), 0..5).prop_map(move |map| {
        map.into_iter()
            .filter(|(user, _)| *user != owner)
            .map(|(user, permission)| ShareEntry::new(user, permission))
            .collect()
    })
}

/// Generate a structurally valid document: the title is non-blank, the
/// token exists exactly under Link visibility, and the share set holds
/// unique non-owner users.
pub fn document() -> impl Strategy<Value = Document> {
    (document_id(), title(), user_id(), visibility(), link_token()).prop_flat_map(
        |(id, title, owner, visibility, token)| {
            (
                Just(id),
                Just(title),
                "[a-z ]{0,40}",
                Just(owner),
                share_entries(owner),
                Just(visibility),
                Just(token),
                tag_set(4),
                any::<bool>(),
                0i64..=1_700_000_000_000i64,
            )
                .prop_map(
                    |(id, title, content, owner, shared_with, visibility, token, tags, is_starred, created_at)| {
                        Document {
                            id,
                            title,
                            content: content.to_string(),
                            owner,
                            shared_with,
                            visibility,
                            link_token: (visibility == Visibility::Link).then_some(token),
                            tags,
                            is_starred,
                            version: 1,
                            created_at,
                            updated_at: created_at,
                        }
                    },
                )
        },
    )
}
