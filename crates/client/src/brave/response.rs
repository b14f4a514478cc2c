//! Brave Search API response types and normalization.

use hvsum_core::SearchResult;
use serde::Deserialize;

/// Raw response from Brave Web Search API.
#[derive(Debug, Deserialize)]
pub struct BraveApiResponse {
    #[serde(default)]
    pub query: Option<QueryInfo>,
    #[serde(default)]
    pub web: Option<WebResults>,
}

/// Query metadata from Brave response.
#[derive(Debug, Deserialize)]
pub struct QueryInfo {
    pub original: String,
    #[serde(default)]
    #[serde(alias = "moreResultsAvailable")]
    pub more_results_available: bool,
}

/// Web search results container.
#[derive(Debug, Deserialize)]
pub struct WebResults {
    pub results: Vec<WebResult>,
}

/// Individual web search result from Brave.
#[derive(Debug, Deserialize)]
pub struct WebResult {
    pub title: String,
    #[serde(alias = "url")]
    pub source_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extra_snippets: Vec<String>,
}

impl BraveApiResponse {
    /// Normalize into core results. An empty description falls back to the
    /// first extra snippet.
    pub fn into_results(self, limit: usize) -> Vec<SearchResult> {
        self.web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|r| {
                let snippet = if r.description.is_empty() {
                    r.extra_snippets.into_iter().next().unwrap_or_default()
                } else {
                    r.description
                };
                SearchResult::new(r.title, r.source_url, snippet, super::ENGINE_NAME)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_JSON: &str = r#"{
        "query": {
            "original": "test query",
            "moreResultsAvailable": true
        },
        "web": {
            "results": [
                {
                    "title": "Example Domain",
                    "url": "https://example.com",
                    "description": "This domain is for use in illustrative examples",
                    "extra_snippets": ["First snippet", "Second snippet"]
                },
                {
                    "title": "Test Page",
                    "url": "https://test.com",
                    "description": "",
                    "extra_snippets": ["Only snippet"]
                }
            ]
        }
    }"#;

    #[test]
    fn test_deserialize_brave_response() {
        let response: BraveApiResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        let query = response.query.unwrap();
        assert_eq!(query.original, "test query");
        assert!(query.more_results_available);
        assert_eq!(response.web.unwrap().results.len(), 2);
    }

    #[test]
    fn test_normalize_results() {
        let raw: BraveApiResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        let results = raw.into_results(10);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Example Domain");
        assert_eq!(results[0].url, "https://example.com");
        assert_eq!(results[0].snippet, "This domain is for use in illustrative examples");
        assert_eq!(results[0].source_engine, "brave");
        assert_eq!(results[1].snippet, "Only snippet");
    }

    #[test]
    fn test_normalize_respects_limit() {
        let raw: BraveApiResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        assert_eq!(raw.into_results(1).len(), 1);
    }

    #[test]
    fn test_missing_web_section() {
        let raw: BraveApiResponse = serde_json::from_str(r#"{"query": {"original": "test"}}"#).unwrap();
        assert!(raw.into_results(5).is_empty());
    }
}
