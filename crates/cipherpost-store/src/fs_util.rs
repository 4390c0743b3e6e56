//! Atomic file writes and the cross-process index lock.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use cipherpost_core::{Error, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Mode for world-readable records (public keys, index, envelopes).
pub(crate) const MODE_PUBLIC: u32 = 0o644;

/// Mode for locked private keys.
pub(crate) const MODE_PRIVATE: u32 = 0o600;

const LOCK_RETRY: Duration = Duration::from_millis(10);
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Write `data` to `path` so readers see either the old file or the complete
/// new one: uniquely named temp file in the same directory, fsync, rename.
pub(crate) fn write_atomic(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    let temp = write_temp(path, data, mode)?;
    temp.persist(path).map_err(|e| {
        warn!(path = %path.display(), error = %e.error, "store: rename failed");
        e.error
    })?;
    Ok(())
}

/// Like [`write_atomic`] but never replaces an existing file.
///
/// Returns `false` and leaves `path` untouched when it already exists.
pub(crate) fn write_new(path: &Path, data: &[u8], mode: u32) -> Result<bool> {
    let temp = write_temp(path, data, mode)?;
    match temp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "store: target exists, not replaced");
            Ok(false)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e.error, "store: link failed");
            Err(e.error.into())
        }
    }
}

/// Temp names start with `.` and end in `.tmp`, so directory scans that only
/// accept `.json` or `.pem` never pick up a half-written file. The temp file
/// is removed if anything fails before it is persisted.
fn write_temp(path: &Path, data: &[u8], mode: u32) -> Result<NamedTempFile> {
    debug!(path = %path.display(), size = data.len(), "store: write");

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        warn!(parent = %parent.display(), error = %e, "store: create_dir_all failed");
        e
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| {
            warn!(parent = %parent.display(), error = %e, "store: temp file create failed");
            e
        })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    if let Err(e) = temp.write_all(data).and_then(|_| temp.as_file().sync_all()) {
        warn!(temp_path = %temp.path().display(), error = %e, "store: write failed");
        return Err(e.into());
    }
    Ok(temp)
}

/// Exclusive advisory lock on a lock file, released on drop.
///
/// Separate processes sharing a data directory serialize on it, and so do
/// separate store instances within one process.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    pub(crate) async fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        let start = Instant::now();
        loop {
            match file.try_lock() {
                Ok(()) => return Ok(Self { file }),
                Err(TryLockError::WouldBlock) => {
                    if start.elapsed() >= LOCK_TIMEOUT {
                        warn!(path = %path.display(), "store: lock wait timed out");
                        return Err(Error::Internal(format!(
                            "timed out waiting for lock {}",
                            path.display()
                        )));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(TryLockError::Error(e)) => return Err(e.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
