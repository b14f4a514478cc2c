//! Cache entry model and its lifecycle rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::hash::CacheKey;
use crate::search::SearchResult;

/// The closed set of values the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Results of a single search query.
    SearchResults(Vec<SearchResult>),
    /// Generated text (summary, outline, answer).
    Text(String),
    /// A derived list of search queries.
    Queries(Vec<String>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::SearchResults(_) => "search_results",
            Payload::Text(_) => "text",
            Payload::Queries(_) => "queries",
        }
    }

    pub fn into_search_results(self) -> Option<Vec<SearchResult>> {
        match self {
            Payload::SearchResults(results) => Some(results),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_queries(self) -> Option<Vec<String>> {
        match self {
            Payload::Queries(queries) => Some(queries),
            _ => None,
        }
    }
}

/// A stored cache entry.
///
/// `created_at`, `ttl_hours` and `payload` never change after creation. The
/// only mutation is [`CacheEntry::commit`], which releases a pending entry
/// into the shared cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub ttl_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

impl CacheEntry {
    /// Build a fresh entry. A non-empty session makes it pending.
    pub fn new(key: CacheKey, payload: Payload, ttl_hours: u32, session_id: Option<&str>, now: DateTime<Utc>) -> Self {
        let session_id = session_id.filter(|s| !s.is_empty()).map(str::to_string);
        let pending = session_id.is_some();
        Self { key, payload, created_at: now, ttl_hours, session_id, pending }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// TTL has elapsed (strictly greater than `ttl_hours`).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::hours(i64::from(self.ttl_hours))
    }

    /// Pending for longer than the grace period, whatever its session.
    pub fn is_abandoned(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.pending && self.age(now) > grace
    }

    /// Whether `sweep_expired` should delete this entry.
    pub fn is_sweepable(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.is_expired(now) || self.is_abandoned(now, grace)
    }

    pub fn belongs_to(&self, session_id: &str) -> bool {
        !session_id.is_empty() && self.session_id.as_deref() == Some(session_id)
    }

    /// Release a pending entry of `session_id` into the shared cache.
    ///
    /// Returns true if the entry changed.
    pub fn commit(&mut self, session_id: &str) -> bool {
        if !(self.pending && self.belongs_to(session_id)) {
            return false;
        }
        self.pending = false;
        self.session_id = None;
        true
    }
}
