//! The visibility state machine and link-token lifecycle.
//!
//! States are `private`, `public`, and `link`. The token exists exactly
//! while the document is in `link`. All functions mutate the in-memory
//! record; the caller persists, retrying on a store-level token collision
//! with a freshly generated value.

use folio_core::{Document, LinkToken, Visibility};

use crate::error::PermsError;

/// What a visibility change did to the link token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEffect {
    /// No token side effect (private/public to private/public).
    None,
    /// Entered Link while a token already existed; it was kept.
    Kept,
    /// Entered Link with no token; a fresh one was generated.
    Generated,
    /// Left Link; the token was cleared.
    Cleared,
}

/// Apply a visibility transition to `doc`.
///
/// - `* → Link`: keep an existing token, otherwise generate one. Re-entering
///   Link is therefore idempotent with respect to the token.
/// - `Link → {Private, Public}`: clear the token.
/// - `{Private, Public} → {Private, Public}`: no token side effect.
pub fn apply_visibility(doc: &mut Document, next: Visibility) -> TokenEffect {
    let effect = match (next, &doc.link_token) {
        (Visibility::Link, Some(_)) => TokenEffect::Kept,
        (Visibility::Link, None) => {
            doc.link_token = Some(LinkToken::generate());
            TokenEffect::Generated
        }
        (_, Some(_)) => {
            doc.link_token = None;
            TokenEffect::Cleared
        }
        (_, None) => TokenEffect::None,
    };
    doc.visibility = next;
    effect
}

/// Replace the token with a freshly generated value, invalidating the
/// previous one immediately.
///
/// Valid only while the document is in Link visibility.
pub fn regenerate_token(doc: &mut Document) -> Result<LinkToken, PermsError> {
    if doc.visibility != Visibility::Link {
        return Err(PermsError::InvalidState(doc.visibility));
    }
    let token = LinkToken::generate();
    doc.link_token = Some(token);
    Ok(token)
}

/// Clear the token and force visibility to Private in one mutation, leaving
/// the document unreachable by any token, old or new.
///
/// Valid only while the document is in Link visibility.
pub fn disable_token(doc: &mut Document) -> Result<(), PermsError> {
    if doc.visibility != Visibility::Link {
        return Err(PermsError::InvalidState(doc.visibility));
    }
    doc.link_token = None;
    doc.visibility = Visibility::Private;
    Ok(())
}
