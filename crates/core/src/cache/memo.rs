//! Typed access and get-or-compute on top of [`ContentStore`].

use std::future::Future;

use super::entry::Payload;
use super::hash::CacheKey;
use super::ContentStore;
use crate::Error;
use crate::search::SearchResult;

/// A value that maps onto exactly one [`Payload`] kind.
pub trait Cacheable: Sized + Send {
    fn into_payload(self) -> Payload;

    /// `None` when the stored payload is of another kind.
    fn from_payload(payload: Payload) -> Option<Self>;
}

impl Cacheable for String {
    fn into_payload(self) -> Payload {
        Payload::Text(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        payload.into_text()
    }
}

impl Cacheable for Vec<String> {
    fn into_payload(self) -> Payload {
        Payload::Queries(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        payload.into_queries()
    }
}

impl Cacheable for Vec<SearchResult> {
    fn into_payload(self) -> Payload {
        Payload::SearchResults(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        payload.into_search_results()
    }
}

/// Typed lookup. A payload of the wrong kind is a miss.
pub async fn get_as<T: Cacheable>(store: &dyn ContentStore, key: &CacheKey) -> Option<T> {
    let payload = store.get(key).await?;
    let kind = payload.kind();
    let value = T::from_payload(payload);
    if value.is_none() {
        tracing::debug!(key = %key, kind, "cached payload has unexpected kind");
    }
    value
}

/// Return the cached value for `key`, or compute, store and return it.
///
/// Errors from `compute` are returned and nothing is cached. A failed cache
/// write is logged and otherwise ignored.
pub async fn memoize<T, F, Fut>(
    store: &dyn ContentStore, key: &CacheKey, ttl_hours: u32, session_id: Option<&str>, compute: F,
) -> Result<T, Error>
where
    T: Cacheable + Clone,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, Error>> + Send,
{
    if let Some(hit) = get_as::<T>(store, key).await {
        tracing::debug!(key = %key, "cache hit");
        return Ok(hit);
    }

    let value = compute().await?;
    if let Err(e) = store.set(key, value.clone().into_payload(), ttl_hours, session_id).await {
        tracing::warn!(key = %key, error = %e, "failed to cache computed value");
    }
    Ok(value)
}
