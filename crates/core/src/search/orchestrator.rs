//! Cached, bounded fan-out over a [`SearchProvider`].
//!
//! A batch moves through `Dispatched -> per query (Pending -> Succeeded |
//! Failed) -> Joined -> Deduplicated -> Truncated`. Failed queries are logged
//! and dropped; there is no retry.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::{SearchProvider, SearchResult, dedup_by_url};
use crate::Error;
use crate::cache::{ContentStore, Payload, fingerprint, get_as};
use crate::descriptor;

/// Default number of results requested per query.
pub const DEFAULT_LIMIT_PER_QUERY: usize = 3;

/// Default number of queries in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default cap on the aggregated result list.
pub const DEFAULT_MAX_RESULTS: usize = 8;

/// One `search_many` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBatch {
    pub queries: Vec<String>,
    pub limit_per_query: usize,
    /// Maximum simultaneous provider calls. Zero is treated as one.
    pub concurrency: usize,
    pub max_results: usize,
    /// Session that owns any entries cached by this batch.
    pub session_id: Option<String>,
}

impl SearchBatch {
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            limit_per_query: DEFAULT_LIMIT_PER_QUERY,
            concurrency: DEFAULT_CONCURRENCY,
            max_results: DEFAULT_MAX_RESULTS,
            session_id: None,
        }
    }

    pub fn limit_per_query(mut self, limit: usize) -> Self {
        self.limit_per_query = limit;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Trimmed, non-empty queries with duplicates removed, in input order.
    fn dispatch_list(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty() && seen.insert(*q))
            .map(str::to_string)
            .collect()
    }
}

/// Runs search queries through the cache and a provider.
#[derive(Clone)]
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    store: Arc<dyn ContentStore>,
    ttl_hours: u32,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("provider", &self.provider.name())
            .field("store", &self.store)
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn SearchProvider>, store: Arc<dyn ContentStore>, ttl_hours: u32) -> Self {
        Self { provider, store, ttl_hours }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Cache-checked single query.
    ///
    /// Non-empty provider results are cached under `session_id` (pending when
    /// set). Provider errors are returned and never cached.
    pub async fn search_one(
        &self, query: &str, limit: usize, session_id: Option<&str>,
    ) -> Result<Vec<SearchResult>, Error> {
        let key = fingerprint(&descriptor::search(query, limit));

        if let Some(cached) = get_as::<Vec<SearchResult>>(self.store.as_ref(), &key).await {
            tracing::debug!(query, results = cached.len(), "search cache hit");
            return Ok(cached);
        }

        let results = self.provider.search(query, limit).await?;
        tracing::debug!(query, provider = self.provider.name(), results = results.len(), "search completed");

        if !results.is_empty()
            && let Err(e) = self
                .store
                .set(&key, Payload::SearchResults(results.clone()), self.ttl_hours, session_id)
                .await
        {
            tracing::debug!(query, error = %e, "failed to cache search results");
        }

        Ok(results)
    }

    /// Run a batch of queries with bounded concurrency.
    ///
    /// Results are concatenated in dispatch order, deduplicated by URL (first
    /// wins) and truncated to `max_results`. Individual failures are dropped.
    /// Returns [`Error::AllQueriesFailed`] only if every dispatched query failed.
    pub async fn search_many(&self, batch: &SearchBatch) -> Result<Vec<SearchResult>, Error> {
        let queries = batch.dispatch_list();
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(batch.concurrency.max(1)));

        tracing::debug!(queries = queries.len(), concurrency = batch.concurrency, "dispatching search batch");

        // Dropping a JoinHandle detaches its task; abandoned batches still finish and fill the cache.
        let handles: Vec<JoinHandle<Result<Vec<SearchResult>, Error>>> = queries
            .iter()
            .cloned()
            .map(|query| {
                let semaphore = semaphore.clone();
                let this = self.clone();
                let session_id = batch.session_id.clone();
                let limit = batch.limit_per_query;

                tokio::spawn(async move {
                    match semaphore.acquire_owned().await {
                        // NOTE: permit is held until the provider call returns
                        Ok(_permit) => this.search_one(&query, limit, session_id.as_deref()).await,
                        Err(e) => {
                            Err(Error::SearchFailed { provider: this.provider.name().to_string(), message: e.to_string() })
                        }
                    }
                })
            })
            .collect();

        let mut per_query = Vec::with_capacity(queries.len());
        let mut failed = 0usize;

        for (query, handle) in queries.iter().zip(handles) {
            match handle.await {
                Ok(Ok(results)) => per_query.push(results),
                Ok(Err(e)) => {
                    failed += 1;
                    if e.is_transient() {
                        tracing::debug!(query = %query, error = %e, "search query failed");
                    } else {
                        tracing::warn!(query = %query, error = %e, "search query failed");
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(query = %query, error = %e, "search task did not complete");
                }
            }
        }

        if failed == queries.len() {
            return Err(Error::AllQueriesFailed { failed });
        }

        let mut results = dedup_by_url(per_query.into_iter().flatten());
        results.truncate(batch.max_results);

        tracing::debug!(
            succeeded = queries.len() - failed,
            failed,
            results = results.len(),
            "search batch completed"
        );
        Ok(results)
    }
}
