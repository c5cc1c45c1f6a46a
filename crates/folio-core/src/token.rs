//! Link-access secret tokens.
//!
//! A link token is the single secret that grants read access to a document
//! in `link` visibility. Tokens carry 256 bits of entropy drawn from the
//! operating system's secure random source and render as a fixed-length
//! 64-character lowercase hexadecimal string.

use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CoreError;

/// Length of the rendered token in hexadecimal characters.
pub const TOKEN_HEX_LEN: usize = 64;

/// A 32-byte link-access token.
///
/// Two tokens are equal only if all 32 bytes match; there is no partial or
/// prefix matching anywhere in the system.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkToken(pub [u8; 32]);

impl LinkToken {
    /// Generate a fresh token from the OS secure random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a 64-character lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hexadecimal string.
    ///
    /// The input must be exactly [`TOKEN_HEX_LEN`] characters; anything else
    /// is rejected without inspecting the store.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != TOKEN_HEX_LEN {
            return Err(CoreError::MalformedToken(s.len()));
        }
        let bytes = hex::decode(s).map_err(|_| CoreError::MalformedToken(s.len()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

// Debug shows only a prefix: tokens are secrets and must not leak whole
// into logs.
impl fmt::Debug for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkToken({}..)", &self.to_hex()[..8])
    }
}

impl Serialize for LinkToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LinkToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LinkToken::from_hex(&s).map_err(D::Error::custom)
    }
}
