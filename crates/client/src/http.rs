//! Shared HTTP plumbing for the search providers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::error::ProviderError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("hvsum/", env!("CARGO_PKG_VERSION"));

/// Connection settings common to every provider.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl HttpSettings {
    pub fn from_config(config: &hvsum_core::AppConfig) -> Self {
        Self { timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }

    /// Build a reqwest client. The timeout is the only cancellation a request gets.
    pub fn build_client(&self) -> Result<Client, ProviderError> {
        Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ProviderError::Network(Arc::new(e)))
    }
}

/// Map a response status onto the provider error taxonomy.
pub(crate) fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::AuthError);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }

    if status.is_client_error() || status.is_server_error() {
        return Err(ProviderError::HttpError { status: status.as_u16() });
    }

    Ok(())
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    check_status(response.status())?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Rate limiter to enforce a minimum interval between requests.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    pub(crate) async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(check_status(StatusCode::UNAUTHORIZED), Err(ProviderError::AuthError)));
        assert!(matches!(check_status(StatusCode::FORBIDDEN), Err(ProviderError::AuthError)));
        assert!(matches!(check_status(StatusCode::TOO_MANY_REQUESTS), Err(ProviderError::RateLimited)));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ProviderError::HttpError { status: 502 })
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let config = hvsum_core::AppConfig { timeout_ms: 2_500, user_agent: "test-agent".into(), ..Default::default() };
        let settings = HttpSettings::from_config(&config);
        assert_eq!(settings.timeout, Duration::from_millis(2_500));
        assert_eq!(settings.user_agent, "test-agent");
        assert!(settings.build_client().is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
