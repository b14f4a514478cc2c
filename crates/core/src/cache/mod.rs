//! Session-aware result cache.
//!
//! Memoizes expensive, idempotent operations (web search, generation) keyed by
//! a fingerprint of their inputs. Entries written on behalf of a session stay
//! *pending* until the session is committed or discarded:
//!
//! - `set` with a session id creates a pending entry, visible to `get` at once
//! - `commit` releases a session's pending entries into the shared cache
//! - `discard` deletes every entry still tagged with the session
//! - `sweep_expired` deletes TTL-expired entries and pending entries older than
//!   the grace period
//!
//! Every operation is best-effort. A broken cache degrades to "always miss".

pub mod clock;
pub mod entry;
pub mod file;
pub mod hash;
pub mod memo;
pub mod memory;

use async_trait::async_trait;
use chrono::Duration;

pub use crate::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Payload};
pub use file::FileStore;
pub use hash::{CacheKey, fingerprint};
pub use memo::{Cacheable, get_as, memoize};
pub use memory::{MemoryStore, NullStore};

/// Default lifetime, in hours, of a pending entry whose session never finished.
pub const DEFAULT_PENDING_GRACE_HOURS: u32 = 1;

pub(crate) fn default_pending_grace() -> Duration {
    Duration::hours(i64::from(DEFAULT_PENDING_GRACE_HOURS))
}

/// Storage backend for cache entries.
///
/// Implementations must tolerate concurrent calls for the same key; the last
/// write wins.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug {
    /// Look up a live entry.
    ///
    /// Missing, expired (deleted as a side effect) and unreadable entries all
    /// return `None`.
    async fn get(&self, key: &CacheKey) -> Option<Payload>;

    /// Store `payload` under `key`, replacing any existing entry.
    ///
    /// A non-empty `session_id` makes the entry pending.
    async fn set(
        &self, key: &CacheKey, payload: Payload, ttl_hours: u32, session_id: Option<&str>,
    ) -> Result<(), Error>;

    /// Release all pending entries of `session_id`. Returns how many changed.
    async fn commit(&self, session_id: &str) -> Result<u64, Error>;

    /// Delete all entries tagged with `session_id`. Returns how many were deleted.
    async fn discard(&self, session_id: &str) -> Result<u64, Error>;

    /// Delete expired and abandoned pending entries. Returns how many were deleted.
    async fn sweep_expired(&self) -> Result<u64, Error>;

    /// Delete everything. Returns how many entries were deleted.
    async fn clear(&self) -> Result<u64, Error>;
}
