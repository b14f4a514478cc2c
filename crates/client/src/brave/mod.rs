//! Brave Search API client.
//!
//! Provides a client for the Brave Web Search API with rate limiting,
//! request validation, and response normalization.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.search.brave.com/res/v1/web/search`
//! - **Authentication**: Uses `X-Subscription-Token` header.
//! - **Rate Limiting**: one request per second (free tier), enforced client side.
//! - **Normalization**: Converts Brave's response into the core `SearchResult`.

pub mod request;
pub mod response;

pub use request::SearchRequest;
pub use response::BraveApiResponse;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hvsum_core::{SearchProvider, SearchResult};

use crate::error::ProviderError;
use crate::http::{HttpSettings, RateLimiter, read_json};

/// Name reported as `source_engine`.
pub const ENGINE_NAME: &str = "brave";

/// Default base URL for Brave Search API.
const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Minimum interval between requests for rate limiting (1 second for free tier).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Brave API client configuration.
#[derive(Debug, Clone)]
pub struct BraveConfig {
    pub api_key: String,
    /// Base URL (default: https://api.search.brave.com/res/v1).
    pub base_url: String,
    pub http: HttpSettings,
    pub min_interval: Duration,
    /// Freshness filter sent with every query (`pd`, `pw`, `pm`, `py` or a date range).
    pub freshness: Option<String>,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpSettings::default(),
            min_interval: MIN_REQUEST_INTERVAL,
            freshness: None,
        }
    }
}

impl BraveConfig {
    pub fn new(api_key: impl Into<String>, http: HttpSettings) -> Self {
        Self { api_key: api_key.into(), http, ..Default::default() }
    }
}

/// Brave Search API client.
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    config: BraveConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl BraveClient {
    /// Create a new Brave client with the given configuration.
    pub fn new(config: BraveConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("HVSUM_BRAVE_API_KEY"));
        }
        if let Some(freshness) = &config.freshness {
            SearchRequest::validate_freshness(freshness)?;
        }

        let http = config.http.build_client()?;
        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval));

        Ok(Self { http, config, rate_limiter })
    }

    /// Execute a web search request.
    ///
    /// Validates the request, waits for the rate limiter, and maps error statuses.
    pub async fn execute(&self, req: &SearchRequest) -> Result<BraveApiResponse, ProviderError> {
        req.validate()?;

        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let url = format!("{}/web/search", self.config.base_url);

        tracing::debug!(query = %req.q, "searching Brave API");

        let http_response = self
            .http
            .get(&url)
            .header("X-Subscription-Token", &self.config.api_key)
            .header("Accept", "application/json")
            .query(req)
            .send()
            .await?;

        tracing::debug!(status = %http_response.status(), "Brave API response");

        let api_response: BraveApiResponse = read_json(http_response).await?;

        tracing::debug!(
            elapsed = ?start.elapsed(),
            results = api_response.web.as_ref().map(|w| w.results.len()).unwrap_or(0),
            "Brave search completed"
        );

        Ok(api_response)
    }
}

#[async_trait]
impl SearchProvider for BraveClient {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, hvsum_core::Error> {
        let req =
            SearchRequest { freshness: self.config.freshness.clone(), ..SearchRequest::for_query(query, limit) };
        let response = self.execute(&req).await.map_err(|e| e.into_core(ENGINE_NAME))?;
        Ok(response.into_results(limit))
    }
}
