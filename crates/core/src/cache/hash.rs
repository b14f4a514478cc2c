//! Content-addressed cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a fingerprint in hex characters (128 bits).
pub const KEY_HEX_LEN: usize = 32;

/// Opaque fixed-length cache key.
///
/// Always 32 lowercase hex characters, which also makes it safe to use as a
/// file stem inside the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheKey(String);

impl CacheKey {
    /// Parse a key from its hex form, e.g. a cache file stem.
    pub fn parse(hex_key: &str) -> Result<Self, crate::Error> {
        if hex_key.len() == KEY_HEX_LEN && hex_key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(Self(hex_key.to_string()))
        } else {
            Err(crate::Error::InvalidKey(hex_key.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Compute the cache key for a canonical request descriptor.
///
/// SHA-256 truncated to 128 bits. Collisions are possible in principle and are
/// not defended against.
pub fn fingerprint(descriptor: &str) -> CacheKey {
    let digest = Sha256::digest(descriptor.as_bytes());
    CacheKey(hex::encode(&digest[..KEY_HEX_LEN / 2]))
}
