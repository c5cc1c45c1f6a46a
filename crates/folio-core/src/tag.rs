//! Tag records and tag-name normalization.
//!
//! Tags are global, lazily created on first reference, and never deleted by
//! this kernel. A tag name is stored in exactly one normalized form so that
//! "Work", "work", and " WORK " all resolve to the same identity.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::TagId;

/// A tag record. `name` is always in normalized form and unique store-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Normalize a tag name: trim surrounding whitespace and lower-case.
///
/// An input that normalizes to the empty string is invalid.
pub fn normalize_tag_name(name: &str) -> Result<String, CoreError> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CoreError::EmptyTagName);
    }
    Ok(normalized)
}
