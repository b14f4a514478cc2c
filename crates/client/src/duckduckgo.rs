//! DuckDuckGo Instant Answer API client.
//!
//! The instant answer API is keyless and returns at most a handful of
//! "answers" rather than a ranked web result list, so the results are built
//! from the answer, abstract, definition and related topics, in that order.

use async_trait::async_trait;
use hvsum_core::{SearchProvider, SearchResult};
use serde::Deserialize;
use url::Url;

use crate::error::ProviderError;
use crate::http::{HttpSettings, read_json};

/// Name reported as `source_engine`.
pub const ENGINE_NAME: &str = "duckduckgo";

const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com/";

const SEARCH_PAGE_URL: &str = "https://duckduckgo.com/";

/// Raw Instant Answer response. Only the fields we read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub abstract_text: String,
    #[serde(default, rename = "Abstract")]
    pub abstract_: String,
    #[serde(default, rename = "AbstractURL")]
    pub abstract_url: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub related_topics: Vec<RelatedTopic>,
}

/// A related topic entry. Topic groups have no `Text` and are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelatedTopic {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "FirstURL")]
    pub first_url: String,
}

/// Link to the DuckDuckGo results page for `query`.
fn search_page(query: &str) -> String {
    match Url::parse_with_params(SEARCH_PAGE_URL, &[("q", query)]) {
        Ok(url) => url.to_string(),
        Err(_) => SEARCH_PAGE_URL.to_string(),
    }
}

impl InstantAnswer {
    /// Normalize into at most `limit` results.
    pub fn into_results(self, query: &str, limit: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if !self.answer.is_empty() {
            results.push(SearchResult::new(format!("Answer: {query}"), search_page(query), self.answer, ENGINE_NAME));
        }

        let abstract_text = if self.abstract_.is_empty() { self.abstract_text } else { self.abstract_ };
        if !abstract_text.is_empty() {
            let title = if self.heading.is_empty() { format!("Information about: {query}") } else { self.heading };
            let url = if self.abstract_url.is_empty() { search_page(query) } else { self.abstract_url };
            results.push(SearchResult::new(title, url, abstract_text, ENGINE_NAME));
        }

        if !self.definition.is_empty() {
            results.push(SearchResult::new(
                format!("Definition: {query}"),
                search_page(query),
                self.definition,
                ENGINE_NAME,
            ));
        }

        for topic in self.related_topics {
            if results.len() >= limit {
                break;
            }
            if topic.text.is_empty() || topic.first_url.is_empty() {
                continue;
            }
            let label = topic.text.split(" - ").next().unwrap_or(&topic.text);
            let title = format!("Related: {label}");
            results.push(SearchResult::new(title, topic.first_url, topic.text, ENGINE_NAME));
        }

        results.truncate(limit);
        results
    }
}

/// DuckDuckGo Instant Answer client.
#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    http: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self { http: settings.build_client()?, base_url: DEFAULT_BASE_URL.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn instant_answer(&self, query: &str) -> Result<InstantAnswer, ProviderError> {
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        tracing::debug!(query, "querying DuckDuckGo instant answers");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("no_html", "1"), ("skip_disambig", "1")])
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, hvsum_core::Error> {
        let answer = self.instant_answer(query).await.map_err(|e| e.into_core(ENGINE_NAME))?;
        Ok(answer.into_results(query, limit))
    }
}
