//! In-process stores: a map-backed double and a disabled cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, Payload};
use super::hash::CacheKey;
use super::{ContentStore, default_pending_grace};
use crate::Error;

/// Map-backed store with the same lifecycle rules as [`super::FileStore`].
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
    pending_grace: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock: Arc::new(SystemClock), pending_grace: default_pending_grace() }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pending_grace(mut self, grace: Duration) -> Self {
        self.pending_grace = grace;
        self
    }

    /// Raw entry, including expired ones. For inspection in tests.
    pub async fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Option<Payload> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.is_expired(self.clock.now()) {
            entries.remove(key);
            return None;
        }
        Some(entry.payload.clone())
    }

    async fn set(
        &self, key: &CacheKey, payload: Payload, ttl_hours: u32, session_id: Option<&str>,
    ) -> Result<(), Error> {
        let entry = CacheEntry::new(key.clone(), payload, ttl_hours, session_id, self.clock.now());
        self.entries.lock().await.insert(key.clone(), entry);
        Ok(())
    }

    async fn commit(&self, session_id: &str) -> Result<u64, Error> {
        let mut entries = self.entries.lock().await;
        let mut committed = 0u64;
        for entry in entries.values_mut() {
            if entry.commit(session_id) {
                committed += 1;
            }
        }
        Ok(committed)
    }

    async fn discard(&self, session_id: &str) -> Result<u64, Error> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !e.belongs_to(session_id));
        Ok((before - entries.len()) as u64)
    }

    async fn sweep_expired(&self) -> Result<u64, Error> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_sweepable(now, self.pending_grace));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> Result<u64, Error> {
        let mut entries = self.entries.lock().await;
        let removed = entries.len();
        entries.clear();
        Ok(removed as u64)
    }
}

/// Store used when caching is disabled: every read misses, every write is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl ContentStore for NullStore {
    async fn get(&self, _key: &CacheKey) -> Option<Payload> {
        None
    }

    async fn set(
        &self, _key: &CacheKey, _payload: Payload, _ttl_hours: u32, _session_id: Option<&str>,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn commit(&self, _session_id: &str) -> Result<u64, Error> {
        Ok(0)
    }

    async fn discard(&self, _session_id: &str) -> Result<u64, Error> {
        Ok(0)
    }

    async fn sweep_expired(&self) -> Result<u64, Error> {
        Ok(0)
    }

    async fn clear(&self) -> Result<u64, Error> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::hash::fingerprint;

    fn store_with_clock() -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (MemoryStore::new().with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_scenario_ttl_expiry() {
        let (store, clock) = store_with_clock();
        let key = fingerprint("k1");
        let value = Payload::Text(r#"{"x":1}"#.into());
        store.set(&key, value.clone(), 24, None).await.unwrap();

        assert_eq!(store.get(&key).await, Some(value));

        clock.advance(Duration::hours(25));
        assert!(store.get(&key).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_scenario_commit_then_discard() {
        let (store, _clock) = store_with_clock();
        let key = fingerprint("k2");
        let value = Payload::Queries(vec!["rust tokio semaphore".into()]);
        store.set(&key, value.clone(), 24, Some("S1")).await.unwrap();
        assert!(store.entry(&key).await.unwrap().pending);

        assert_eq!(store.commit("S1").await.unwrap(), 1);
        assert_eq!(store.get(&key).await, Some(value.clone()));

        assert_eq!(store.discard("S1").await.unwrap(), 0);
        assert_eq!(store.get(&key).await, Some(value));
    }

    #[tokio::test]
    async fn test_discard_only_matching_session() {
        let (store, _clock) = store_with_clock();
        store.set(&fingerprint("a"), Payload::Text("a".into()), 24, Some("S1")).await.unwrap();
        store.set(&fingerprint("b"), Payload::Text("b".into()), 24, Some("S2")).await.unwrap();
        store.set(&fingerprint("c"), Payload::Text("c".into()), 24, None).await.unwrap();

        assert_eq!(store.discard("S1").await.unwrap(), 1);
        assert_eq!(store.len().await, 2);
        assert!(store.get(&fingerprint("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_abandoned_pending() {
        let (store, clock) = store_with_clock();
        store.set(&fingerprint("p"), Payload::Text("p".into()), 24, Some("S1")).await.unwrap();
        store.set(&fingerprint("f"), Payload::Text("f".into()), 24, None).await.unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert!(store.get(&fingerprint("f")).await.is_some());
    }

    #[tokio::test]
    async fn test_clear_counts() {
        let (store, _clock) = store_with_clock();
        store.set(&fingerprint("a"), Payload::Text("a".into()), 24, None).await.unwrap();
        store.set(&fingerprint("b"), Payload::Text("b".into()), 24, Some("S")).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_null_store_always_misses() {
        let store = NullStore;
        let key = fingerprint("k");
        store.set(&key, Payload::Text("v".into()), 24, Some("S")).await.unwrap();
        assert!(store.get(&key).await.is_none());
        assert_eq!(store.commit("S").await.unwrap(), 0);
        assert_eq!(store.clear().await.unwrap(), 0);
    }
}

#[cfg(test)]
mod tests_extra {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::hash::fingerprint;

    fn text(s: &str) -> Payload {
        Payload::Text(s.to_string())
    }

    #[tokio::test]
    async fn test_commit_counts_only_session_pending() {
        let store = MemoryStore::new();
        store.set(&fingerprint("a"), text("a"), 24, Some("S")).await.unwrap();
        store.set(&fingerprint("b"), text("b"), 24, Some("S")).await.unwrap();
        store.set(&fingerprint("c"), text("c"), 24, Some("T")).await.unwrap();
        store.set(&fingerprint("d"), text("d"), 24, None).await.unwrap();

        assert_eq!(store.commit("S").await.unwrap(), 2);
        assert_eq!(store.commit("S").await.unwrap(), 0);

        let committed = store.entry(&fingerprint("a")).await.unwrap();
        assert!(!committed.pending);
        assert!(committed.session_id.is_none());
        assert!(store.entry(&fingerprint("c")).await.unwrap().pending);
    }

    #[tokio::test]
    async fn test_discard_leaves_committed_entries() {
        let store = MemoryStore::new();
        store.set(&fingerprint("a"), text("a"), 24, Some("S")).await.unwrap();
        store.commit("S").await.unwrap();
        store.set(&fingerprint("b"), text("b"), 24, Some("S")).await.unwrap();

        assert_eq!(store.discard("S").await.unwrap(), 1);
        assert_eq!(store.get(&fingerprint("a")).await, Some(text("a")));
        assert!(store.get(&fingerprint("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_get_drops_expired() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryStore::new().with_clock(clock.clone());
        store.set(&fingerprint("a"), text("a"), 1, None).await.unwrap();

        clock.advance(Duration::minutes(61));
        assert!(store.get(&fingerprint("a")).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_null_store_never_hits() {
        let store = NullStore;
        store.set(&fingerprint("a"), text("a"), 24, None).await.unwrap();
        assert!(store.get(&fingerprint("a")).await.is_none());
        assert_eq!(store.clear().await.unwrap(), 0);
    }
}
