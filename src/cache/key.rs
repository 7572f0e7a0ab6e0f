//! Deterministic cache keys derived from ordered attribute tuples.

use std::fmt;

use sha2::{Digest, Sha256};

/// Identifier of one cached resource.
///
/// A lowercase hex SHA-256 digest of the length-prefixed attribute tuple.
/// Length prefixing keeps `("ab", "c")` and `("a", "bc")` apart without
/// reserving a separator character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from an ordered tuple of attributes.
    ///
    /// # Example
    /// ```
    /// use rescache::cache::CacheKey;
    /// let a = CacheKey::derive(["tenant-1", "openai", "text-embedding-3-small"]);
    /// let b = CacheKey::derive(["tenant-1", "openai", "text-embedding-3-small"]);
    /// assert_eq!(a, b);
    /// ```
    pub fn derive<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for attr in attributes {
            let bytes = attr.as_ref().as_bytes();
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Derive a key where missing attributes count as empty strings.
    ///
    /// Position is preserved: `[None, Some("x")]` equals `["", "x"]`, not `["x"]`.
    pub fn derive_optional<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        Self::derive(attributes.into_iter().map(|a| a.unwrap_or_default()))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
