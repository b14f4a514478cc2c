//! SerpAPI client (Google engine).

use async_trait::async_trait;
use hvsum_core::{SearchProvider, SearchResult};
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::{HttpSettings, read_json};

/// Name reported as `source_engine`.
pub const ENGINE_NAME: &str = "serpapi";

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";

#[derive(Debug, Deserialize)]
pub struct SerpApiResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    /// Set by SerpAPI on failures that still return 200.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl SerpApiResponse {
    pub fn into_results(self, limit: usize) -> Vec<SearchResult> {
        self.organic_results
            .into_iter()
            .take(limit)
            .map(|r| SearchResult::new(r.title, r.link, r.snippet, ENGINE_NAME))
            .collect()
    }
}

/// SerpAPI client.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>, settings: &HttpSettings) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("HVSUM_SERPAPI_KEY"));
        }
        Ok(Self { http: settings.build_client()?, api_key, base_url: DEFAULT_BASE_URL.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn execute(&self, query: &str, limit: usize) -> Result<SerpApiResponse, ProviderError> {
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        tracing::debug!(query, limit, "querying SerpAPI");

        let num = limit.max(1).to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", query), ("api_key", self.api_key.as_str()), ("engine", "google"), ("num", num.as_str())])
            .send()
            .await?;

        let body: SerpApiResponse = read_json(response).await?;
        if let Some(error) = &body.error
            && body.organic_results.is_empty()
        {
            tracing::debug!(error = %error, "SerpAPI reported an error");
        }
        Ok(body)
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, hvsum_core::Error> {
        let response = self.execute(query, limit).await.map_err(|e| e.into_core(ENGINE_NAME))?;
        Ok(response.into_results(limit))
    }
}
