//! Strong identifier types for Folio.
//!
//! All identifiers are 16-byte newtypes to prevent misuse at compile time.
//! They are opaque: assigned by the store at creation and compared by value
//! only, never by object identity.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 16-byte document identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub [u8; 16]);

/// A 16-byte user identifier.
///
/// The core never resolves this to a user record; it is the canonical
/// representation for every membership and ownership comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub [u8; 16]);

/// A 16-byte tag identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub [u8; 16]);

macro_rules! impl_id {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                let mut bytes = [0u8; 16];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                Self(bytes)
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                if bytes.len() != 16 {
                    return Err(hex::FromHexError::InvalidStringLength);
                }
                let mut arr = [0u8; 16];
                arr.copy_from_slice(&bytes);
                Ok(Self(arr))
            }

            /// The zero identifier (sentinel).
            pub const ZERO: Self = Self([0u8; 16]);
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
        }
    };
}

impl_id!(DocumentId, "DocumentId");
impl_id!(UserId, "UserId");
impl_id!(TagId, "TagId");
