//! Brave Search API request types and validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ProviderError;

/// Largest `count` the API accepts.
pub const MAX_COUNT: usize = 20;

static DATE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// Search request parameters for Brave Web Search API.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchRequest {
    /// Search query (required, max 400 chars / 50 words).
    pub q: String,

    /// Number of results (1-20, default 20).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,

    /// Freshness filter: pd|pw|pm|py or YYYY-MM-DDtoYYYY-MM-DD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freshness: Option<String>,
}

impl SearchRequest {
    /// Request for `query`, asking for `limit` results clamped into the API range.
    pub fn for_query(query: &str, limit: usize) -> Self {
        let count = limit.clamp(1, MAX_COUNT) as u8;
        Self { q: query.trim().to_string(), count: Some(count), ..Default::default() }
    }

    /// Validate the search request parameters.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.q.is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        let chars = self.q.chars().count();
        if chars > 400 {
            return Err(ProviderError::InvalidQuery(format!("query too long: {chars} chars (max 400)")));
        }

        let word_count = self.q.split_whitespace().count();
        if word_count > 50 {
            return Err(ProviderError::InvalidQuery(format!("query too long: {word_count} words (max 50)")));
        }

        if let Some(count) = self.count
            && !(1..=MAX_COUNT).contains(&usize::from(count))
        {
            return Err(ProviderError::InvalidCount { min: 1, max: MAX_COUNT });
        }

        if let Some(freshness) = &self.freshness {
            Self::validate_freshness(freshness)?;
        }

        Ok(())
    }

    /// Accepts `pd`, `pw`, `pm`, `py` or `YYYY-MM-DDtoYYYY-MM-DD`.
    pub fn validate_freshness(freshness: &str) -> Result<(), ProviderError> {
        const VALID_PRESETS: &[&str] = &["pd", "pw", "pm", "py"];

        if VALID_PRESETS.contains(&freshness) {
            return Ok(());
        }

        if let Some((from, to)) = freshness.split_once("to")
            && let Some(date) = DATE_RE.as_ref()
            && date.is_match(from)
            && date.is_match(to)
        {
            return Ok(());
        }

        Err(ProviderError::InvalidFreshness(freshness.to_string()))
    }
}
