//! One-JSON-file-per-entry cache directory.
//!
//! Layout: `<dir>/<hex-fingerprint>.json`. Writes go to a hidden temp file in
//! the same directory and are renamed into place, so readers never observe a
//! partial entry. Corrupt files are treated as misses and left on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::fs;

use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, Payload};
use super::hash::CacheKey;
use super::{ContentStore, default_pending_grace};
use crate::Error;
use crate::atomic::write_atomic;

const ENTRY_EXT: &str = "json";

/// Filesystem-backed cache store.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    pending_grace: Duration,
}

impl FileStore {
    /// Open a cache directory, creating it if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, clock: Arc::new(SystemClock), pending_grace: default_pending_grace() })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pending_grace(mut self, grace: Duration) -> Self {
        self.pending_grace = grace;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Read and decode one entry file. Any failure is a miss.
    async fn read_entry(path: &Path) -> Option<CacheEntry> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "cache read failed");
                }
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Serialize `entry` and atomically replace its file.
    async fn write_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let bytes = serde_json::to_vec(entry)?;
        write_atomic(&self.entry_path(&entry.key), &bytes).await?;
        Ok(())
    }

    /// Delete a file, treating "already gone" as not deleted.
    async fn remove_quiet(path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "cache delete failed");
                }
                false
            }
        }
    }

    /// Delete `path` only if it still holds `seen`.
    ///
    /// Best effort: a `set` landing between the re-read and the delete can
    /// still be lost, which degrades to a cache miss.
    async fn remove_if_unchanged(path: &Path, seen: &CacheEntry) -> bool {
        match Self::read_entry(path).await {
            Some(current) if current == *seen => Self::remove_quiet(path).await,
            _ => false,
        }
    }

    /// Paths of all entry files currently in the directory.
    async fn entry_paths(&self) -> Result<Vec<PathBuf>, Error> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_entry = path.extension().is_some_and(|ext| ext == ENTRY_EXT)
                && path.file_stem().and_then(|s| s.to_str()).is_some_and(|s| CacheKey::parse(s).is_ok());
            if is_entry && item.file_type().await.is_ok_and(|t| t.is_file()) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn get(&self, key: &CacheKey) -> Option<Payload> {
        let path = self.entry_path(key);
        let entry = Self::read_entry(&path).await?;

        if entry.key != *key {
            tracing::debug!(key = %key, stored = %entry.key, "cache entry key mismatch");
            return None;
        }

        if entry.is_expired(self.clock.now()) {
            tracing::debug!(key = %key, "cache entry expired");
            Self::remove_if_unchanged(&path, &entry).await;
            return None;
        }

        Some(entry.payload)
    }

    async fn set(
        &self, key: &CacheKey, payload: Payload, ttl_hours: u32, session_id: Option<&str>,
    ) -> Result<(), Error> {
        let entry = CacheEntry::new(key.clone(), payload, ttl_hours, session_id, self.clock.now());
        self.write_entry(&entry).await
    }

    async fn commit(&self, session_id: &str) -> Result<u64, Error> {
        if session_id.is_empty() {
            return Ok(0);
        }

        let mut committed = 0u64;
        for path in self.entry_paths().await? {
            let Some(mut entry) = Self::read_entry(&path).await else { continue };
            if entry.commit(session_id) {
                match self.write_entry(&entry).await {
                    Ok(()) => committed += 1,
                    Err(e) => tracing::debug!(key = %entry.key, error = %e, "cache commit write failed"),
                }
            }
        }

        tracing::debug!(committed, session_id, "committed session cache entries");
        Ok(committed)
    }

    async fn discard(&self, session_id: &str) -> Result<u64, Error> {
        if session_id.is_empty() {
            return Ok(0);
        }

        let mut removed = 0u64;
        for path in self.entry_paths().await? {
            let Some(entry) = Self::read_entry(&path).await else { continue };
            if entry.belongs_to(session_id) && Self::remove_quiet(&path).await {
                removed += 1;
            }
        }

        tracing::debug!(removed, session_id, "discarded session cache entries");
        Ok(removed)
    }

    async fn sweep_expired(&self) -> Result<u64, Error> {
        let now = self.clock.now();
        let mut cleaned = 0u64;
        for path in self.entry_paths().await? {
            let Some(entry) = Self::read_entry(&path).await else { continue };
            if entry.is_sweepable(now, self.pending_grace) && Self::remove_if_unchanged(&path, &entry).await {
                cleaned += 1;
            }
        }

        tracing::debug!(cleaned, "swept expired cache entries");
        Ok(cleaned)
    }

    async fn clear(&self) -> Result<u64, Error> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0u64;
        while let Some(item) = dir.next_entry().await? {
            if item.file_type().await.is_ok_and(|t| t.is_file()) && Self::remove_quiet(&item.path()).await {
                removed += 1;
            }
        }

        tracing::debug!(removed, "cleared cache directory");
        Ok(removed)
    }
}
