//! Picture cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors raised while fetching, storing or decoding a picture.
///
/// Inside a batch these are logged and the picture is skipped; only
/// construction paths hand them to callers.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum CacheError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("decode error: {message}")]
    Decode { message: String },
}

impl CacheError {
    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the error came from the network.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CacheError::io("disk full").to_string(),
            "io error: disk full"
        );
        assert_eq!(
            CacheError::network("HTTP 404").to_string(),
            "network error: HTTP 404"
        );
        assert_eq!(
            CacheError::decode("bad header").to_string(),
            "decode error: bad header"
        );
    }

    #[test]
    fn test_is_network_error() {
        assert!(CacheError::network("timeout").is_network_error());
        assert!(!CacheError::io("denied").is_network_error());
    }
}
