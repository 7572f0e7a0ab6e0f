//! Error types for rescache.
//!
//! [`CacheError`] covers configuration and I/O failures plus the two ways a
//! construction can end without a result from its constructor (panic and
//! runtime cancellation). Constructor errors themselves are never wrapped:
//! every cache is generic over the provider's own error type, which only has
//! to be convertible from `CacheError`.

use thiserror::Error;

/// Errors produced by the cache and its configuration layer.
///
/// `Clone` so that one failed construction can be handed to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket error, stored as its message.
    #[error("I/O error: {0}")]
    Io(String),

    /// Config file could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A provider failed to build a resource.
    #[error("Construction failed: {0}")]
    Construction(String),

    /// The constructor panicked while building a resource.
    #[error("Constructor panicked: {0}")]
    ConstructorPanicked(String),

    /// The construction task was cancelled before it finished.
    #[error("Construction aborted before completion")]
    ConstructionAborted,
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for CacheError {
    fn from(err: toml::de::Error) -> Self {
        CacheError::Parse(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CacheError::Construction("backend unreachable".into()).to_string(),
            "Construction failed: backend unreachable"
        );
        assert_eq!(
            CacheError::ConstructionAborted.to_string(),
            "Construction aborted before completion"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::Io(msg) if msg.contains("missing")));
    }

    #[test]
    fn test_from_json_error() {
        let err: CacheError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CacheError::Parse(_)));
    }

    #[test]
    fn test_clone_preserves_equality() {
        let err = CacheError::Construction("bad credentials".into());
        assert_eq!(err.clone(), err);
    }
}
