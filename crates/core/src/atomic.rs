//! Crash-safe file replacement.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Removes the temp file on drop unless it was renamed into place.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to remove temp file");
        }
    }
}

/// Write `bytes` to a hidden sibling temp file, then rename it over `target`.
///
/// Readers see either the old content or the new content, never a mix. The
/// temp name includes the pid and a process-wide counter so concurrent
/// writers to the same target never share a temp file.
pub(crate) async fn write_atomic(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target.file_name().and_then(|n| n.to_str()).unwrap_or("entry");
    let tmp = dir.join(format!(
        ".{name}.{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    // Removed on any early return or cancellation.
    let mut guard = TempFile::new(tmp);
    fs::write(&guard.path, bytes).await?;
    fs::rename(&guard.path, target).await?;
    guard.disarm();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("value.json");

        write_atomic(&target, b"first").await.unwrap();
        write_atomic(&target, b"second").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_temp_file_removed_unless_disarmed() {
        let tmp = tempfile::tempdir().unwrap();
        let dropped = tmp.path().join(".a.tmp");
        let kept = tmp.path().join(".b.tmp");
        std::fs::write(&dropped, b"partial").unwrap();
        std::fs::write(&kept, b"partial").unwrap();

        drop(TempFile::new(dropped.clone()));
        let mut guard = TempFile::new(kept.clone());
        guard.disarm();
        drop(guard);

        assert!(!dropped.exists());
        assert!(kept.exists());
    }

    #[tokio::test]
    async fn test_write_atomic_failed_rename_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("value.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();

        assert!(write_atomic(&target, b"new").await.is_err());

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["value.json"]);
    }

    #[tokio::test]
    async fn test_write_atomic_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("missing").join("value.json");
        assert!(write_atomic(&target, b"x").await.is_err());
    }
}
