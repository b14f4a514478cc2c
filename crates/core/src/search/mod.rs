//! Search results, the provider capability, and batch orchestration.

pub mod multi;
pub mod orchestrator;

use std::collections::HashSet;
use std::fmt::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

pub use multi::MultiProvider;
pub use orchestrator::{SearchBatch, SearchOrchestrator};

/// Normalized web search result.
///
/// Identity for deduplication is `url`, compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source_engine: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>, source_engine: impl Into<String>,
    ) -> Self {
        Self { title: title.into(), url: url.into(), snippet: snippet.into(), source_engine: source_engine.into() }
    }
}

/// Anything that can answer a web search query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short engine name used in logs and `source_engine`.
    fn name(&self) -> &str;

    /// Run one query, returning at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error>;
}

/// Keep the first result for each URL, preserving order.
pub fn dedup_by_url(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

/// Render results as the text block appended to model prompts.
///
/// Returns an empty string for no results.
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n--- WEB SEARCH RESULTS ---\n");
    for (i, r) in results.iter().enumerate() {
        let _ = write!(out, "\nResult {}:\nTitle: {}\nURL: {}\nSnippet: {}\n", i + 1, r.title, r.url, r.snippet);
    }
    out
}
