//! Fan a single query out to several engines.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use super::{SearchProvider, SearchResult, dedup_by_url};
use crate::Error;

/// A provider that queries every engine concurrently and merges the answers.
///
/// Results are concatenated in engine order, deduplicated by URL and truncated
/// to the requested limit. Fails only when every engine failed.
#[derive(Clone, Default)]
pub struct MultiProvider {
    engines: Vec<Arc<dyn SearchProvider>>,
}

impl MultiProvider {
    pub fn new(engines: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { engines }
    }

    pub fn push(&mut self, engine: Arc<dyn SearchProvider>) {
        self.engines.push(engine);
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[async_trait]
impl SearchProvider for MultiProvider {
    fn name(&self) -> &str {
        "multi"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error> {
        if self.engines.is_empty() {
            return Err(Error::InvalidInput("no search engines configured".into()));
        }

        let mut join_set = JoinSet::new();
        for (idx, engine) in self.engines.iter().cloned().enumerate() {
            let query = query.to_string();
            join_set.spawn(async move {
                let result = engine.search(&query, limit).await;
                (idx, engine.name().to_string(), result)
            });
        }

        let mut per_engine: Vec<Option<Vec<SearchResult>>> = vec![None; self.engines.len()];
        let mut errors = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, name, Ok(results))) => {
                    tracing::debug!(engine = %name, results = results.len(), "engine returned results");
                    per_engine[idx] = Some(results);
                }
                Ok((_, name, Err(e))) => {
                    tracing::debug!(engine = %name, error = %e, "engine search failed");
                    errors.push(format!("{name}: {e}"));
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.len() == self.engines.len() {
            return Err(Error::SearchFailed { provider: self.name().to_string(), message: errors.join("; ") });
        }

        let mut results = dedup_by_url(per_engine.into_iter().flatten().flatten());
        results.truncate(limit);
        Ok(results)
    }
}
