use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use super::{SessionData, SessionSeed};
use crate::Error;
use crate::atomic::write_atomic;
use crate::cache::{Clock, ContentStore, SystemClock};

const SESSION_EXT: &str = "json";

/// On-disk store of session transcripts, one `<id>.json` file per session.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

/// Session ids become file names, so they are restricted to a safe alphabet.
fn validate_id(id: &str) -> Result<(), Error> {
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok { Ok(()) } else { Err(Error::InvalidInput(format!("invalid session id: {id:?}"))) }
}

impl SessionRegistry {
    /// Open a sessions directory, creating it if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, clock: Arc::new(SystemClock) })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, Error> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{SESSION_EXT}")))
    }

    /// Start and persist a new session with id `session_<unix-millis>`.
    pub async fn create(&self, seed: SessionSeed) -> Result<SessionData, Error> {
        let now = self.clock.now();
        let mut millis = now.timestamp_millis();
        let mut id = format!("session_{millis}");
        while self.exists(&id).await {
            millis += 1;
            id = format!("session_{millis}");
        }

        let mut session = SessionData::from_seed(id, seed, now);
        self.save(&mut session).await?;
        tracing::info!(session_id = %session.id, "created session");
        Ok(session)
    }

    /// Persist a session, refreshing its timestamps and message count.
    pub async fn save(&self, session: &mut SessionData) -> Result<(), Error> {
        let path = self.path_for(&session.id)?;
        let now = self.clock.now();
        session.last_accessed_at = now;
        session.last_modified = now;
        session.message_count = session.messages.len();

        let bytes = serde_json::to_vec_pretty(session)?;
        write_atomic(&path, &bytes).await?;
        tracing::debug!(session_id = %session.id, messages = session.message_count, "saved session");
        Ok(())
    }

    /// Load a session and record the access.
    pub async fn load(&self, id: &str) -> Result<SessionData, Error> {
        let path = self.path_for(id)?;
        let mut session = Self::read(&path).await.map_err(|e| match e {
            Error::Storage(io) if io.kind() == std::io::ErrorKind::NotFound => Error::SessionNotFound(id.to_string()),
            other => other,
        })?;

        session.last_accessed_at = self.clock.now();
        let bytes = serde_json::to_vec_pretty(&session)?;
        write_atomic(&path, &bytes).await?;
        Ok(session)
    }

    async fn read(path: &Path) -> Result<SessionData, Error> {
        let bytes = fs::read(path).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Session(format!("{}: {e}", path.display())))
    }

    pub async fn exists(&self, id: &str) -> bool {
        match self.path_for(id) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// All readable sessions, in no particular order. Corrupt files are skipped.
    ///
    /// Unlike [`Self::load`] this does not touch access times.
    pub async fn list(&self) -> Result<Vec<SessionData>, Error> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_none_or(|ext| ext != SESSION_EXT) {
                continue;
            }
            if !item.file_type().await.is_ok_and(|t| t.is_file()) {
                continue;
            }
            match Self::read(&path).await {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable session"),
            }
        }
        Ok(sessions)
    }

    /// Most recently accessed sessions first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<SessionData>, Error> {
        let mut sessions = self.list().await?;
        sessions.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    /// Remove a transcript. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, Error> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every file in the sessions directory.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0u64;
        while let Some(item) = dir.next_entry().await? {
            if item.file_type().await.is_ok_and(|t| t.is_file()) && fs::remove_file(item.path()).await.is_ok() {
                removed += 1;
            }
        }
        tracing::debug!(removed, "cleared sessions");
        Ok(removed)
    }

    /// Delete sessions not accessed within `max_age_days`.
    pub async fn clean_old(&self, max_age_days: u32) -> Result<u64, Error> {
        let cutoff = self.clock.now() - chrono::Duration::days(i64::from(max_age_days));
        let mut cleaned = 0u64;
        for session in self.list().await? {
            if session.last_accessed_at < cutoff && self.delete(&session.id).await.unwrap_or(false) {
                cleaned += 1;
            }
        }
        tracing::debug!(cleaned, max_age_days, "cleaned old sessions");
        Ok(cleaned)
    }

    /// End a session and settle its cache entries.
    ///
    /// Kept sessions are saved and their pending entries committed. Dropped
    /// sessions lose their transcript and every entry written under their id.
    /// Returns the number of cache entries committed or discarded.
    pub async fn finish(
        &self, store: &dyn ContentStore, session: &mut SessionData, keep: bool,
    ) -> Result<u64, Error> {
        if keep {
            self.save(session).await?;
            let committed = store.commit(&session.id).await?;
            tracing::info!(session_id = %session.id, committed, "session kept");
            Ok(committed)
        } else {
            self.delete(&session.id).await?;
            let discarded = store.discard(&session.id).await?;
            tracing::info!(session_id = %session.id, discarded, "session discarded");
            Ok(discarded)
        }
    }
}
