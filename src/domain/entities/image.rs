//! Domain types for cached pictures.

use std::sync::Arc;

use sha2::{Digest, Sha256};

/// A decoded picture shared between the cache and its readers.
pub type CachedImage = Arc<image::DynamicImage>;

/// Cache key for a picture URL.
///
/// The lowercase hex SHA-256 digest of the URL bytes. It names both the
/// in-memory entry and the file in the cache directory, so it never contains
/// path separators and always has the same length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of a derived key in characters.
    pub const LEN: usize = 64;

    /// Derives the key for a URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Rebuilds a key from a cache directory entry name.
    ///
    /// Hidden names are in-progress writes and are rejected.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.is_empty() || name.starts_with('.') {
            return None;
        }
        Some(Self(name.to_string()))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
