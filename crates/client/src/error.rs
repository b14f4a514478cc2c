//! Search provider error types.

use std::sync::Arc;

/// Errors from an HTTP search provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Required API key is not configured.
    #[error("missing API key: {0} not set")]
    MissingApiKey(&'static str),

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid result count for this provider.
    #[error("invalid count: must be {min}-{max}")]
    InvalidCount { min: usize, max: usize },

    /// Invalid freshness format.
    #[error("invalid freshness format: {0}")]
    InvalidFreshness(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ProviderError::Timeout } else { ProviderError::Network(Arc::new(err)) }
    }
}

impl ProviderError {
    /// Convert into the core error, tagging it with the provider name.
    pub fn into_core(self, provider: &str) -> hvsum_core::Error {
        match self {
            ProviderError::AuthError => hvsum_core::Error::AuthError(provider.to_string()),
            ProviderError::RateLimited => hvsum_core::Error::RateLimited(provider.to_string()),
            ProviderError::InvalidQuery(reason) => hvsum_core::Error::InvalidInput(reason),
            other => hvsum_core::Error::SearchFailed { provider: provider.to_string(), message: other.to_string() },
        }
    }
}
