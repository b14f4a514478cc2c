//! Unified error types for hvsum.
//!
//! Every variant renders with a stable upper-case code prefix so log lines and
//! user-facing messages stay greppable.

/// Unified error types for the hvsum core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Filesystem operation on the cache or session directory failed.
    #[error("CACHE_ERROR: {0}")]
    Storage(#[from] std::io::Error),

    /// A value could not be serialized for storage.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Cache key is not a 32-character lowercase hex fingerprint.
    #[error("CACHE_ERROR: invalid key format: {0}")]
    InvalidKey(String),

    /// A single search provider call failed.
    #[error("SEARCH_FAILED: {provider}: {message}")]
    SearchFailed { provider: String, message: String },

    /// Search provider rejected the request as rate limited.
    #[error("SEARCH_RATE_LIMITED: {0}")]
    RateLimited(String),

    /// Search provider rejected the credentials.
    #[error("SEARCH_AUTH_ERROR: {0}")]
    AuthError(String),

    /// Every query of a non-empty batch failed.
    #[error("ALL_QUERIES_FAILED: all {failed} queries failed")]
    AllQueriesFailed { failed: usize },

    /// Session transcript is missing.
    #[error("SESSION_NOT_FOUND: {0}")]
    SessionNotFound(String),

    /// Session transcript exists but cannot be used.
    #[error("SESSION_ERROR: {0}")]
    Session(String),
}

impl Error {
    /// Whether the failure is worth retrying on a later user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SearchFailed { .. } | Error::RateLimited(_) | Error::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidKey("abc123".to_string());
        assert!(err.to_string().contains("CACHE_ERROR"));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_search_failed_display() {
        let err = Error::SearchFailed { provider: "brave".into(), message: "HTTP error: 502".into() };
        assert_eq!(err.to_string(), "SEARCH_FAILED: brave: HTTP error: 502");
    }

    #[test]
    fn test_io_error_converts_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io.into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_auth_error_not_transient() {
        assert!(!Error::AuthError("bad key".into()).is_transient());
    }
}
