//! Cross-process lock per (source, replica) pair
//!
//! At most one sync cycle may run against a given folder pair at a
//! time, across all cooperating processes on the host. The lock is an
//! advisory exclusive lock on a file in the system temp directory whose
//! name is derived from the canonicalized pair, taken with a single
//! atomic `try_lock_exclusive` call — there is no check-then-create
//! window. Acquisition is non-blocking with a bounded exponential
//! backoff; exhaustion yields [`Error::LockBusy`] and the caller skips
//! the cycle.
//!
//! On release the file is left in place and invalidated by unlocking.
//! Unlinking it would open a race where a second process locks the
//! removed inode while a third locks a freshly created file at the
//! same path.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::config::SyncConfig;
use crate::error::{Error, Result};

/// Exclusive ownership of a (source, replica) pair for one cycle.
///
/// The lock is released when the handle is dropped, on every exit path.
#[derive(Debug)]
pub struct LockHandle {
    file: File,
    path: PathBuf,
}

impl LockHandle {
    /// Path of the lock file backing this handle.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::debug!(path = %self.path.display(), "released sync lock");
    }
}

/// Deterministic lock file path for a (source, replica) pair.
///
/// Canonicalizes both roots so that different spellings of the same
/// pair contend on the same lock.
pub fn lock_path_for(source: &Path, replica: &Path) -> PathBuf {
    let source = dunce::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
    let replica = dunce::canonicalize(replica).unwrap_or_else(|_| replica.to_path_buf());
    let key = format!("{}\n{}", source.display(), replica.display());
    let digest = mirror_fs::checksum::compute_content_checksum(key.as_bytes());
    let hex = digest.trim_start_matches("sha256:");
    std::env::temp_dir().join(format!("mirror-{}.lock", &hex[..16]))
}

/// Acquire the lock for a (source, replica) pair.
///
/// Retries with exponential backoff within the budget configured in
/// `config`, then fails with [`Error::LockBusy`].
pub fn acquire(source: &Path, replica: &Path, config: &SyncConfig) -> Result<LockHandle> {
    let path = lock_path_for(source, replica);
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.lock_backoff())
        .with_max_elapsed_time(Some(config.lock_retry_budget()))
        .build();

    let handle = backoff::retry(policy, || match try_acquire(&path) {
        Ok(handle) => Ok(handle),
        Err(e) if is_contention(&e) => Err(backoff::Error::transient(e)),
        Err(e) => Err(backoff::Error::permanent(e)),
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(source) => Error::Io(source),
        backoff::Error::Transient { .. } => Error::LockBusy { path: path.clone() },
    })?;

    tracing::debug!(path = %handle.path.display(), "acquired sync lock");
    Ok(handle)
}

/// One non-blocking acquisition attempt.
fn try_acquire(path: &Path) -> std::io::Result<LockHandle> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.try_lock_exclusive()?;

    // Record the owner for operators inspecting a stuck lock. Purely
    // diagnostic: the advisory lock is what enforces exclusion.
    let _ = file.set_len(0);
    let _ = writeln!(file, "{}", std::process::id());

    Ok(LockHandle {
        file,
        path: path.to_path_buf(),
    })
}

fn is_contention(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fast_config() -> SyncConfig {
        SyncConfig {
            lock_retries: 1,
            lock_backoff_ms: 10,
            ..SyncConfig::default()
        }
    }

    #[test]
    fn lock_path_is_deterministic_per_pair() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();

        assert_eq!(
            lock_path_for(a.path(), b.path()),
            lock_path_for(a.path(), b.path())
        );
        assert_ne!(
            lock_path_for(a.path(), b.path()),
            lock_path_for(b.path(), a.path())
        );
    }

    #[test]
    fn acquire_then_release_then_reacquire() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let config = fast_config();

        let handle = acquire(a.path(), b.path(), &config).unwrap();
        drop(handle);

        // Released on drop: a second acquisition must succeed.
        acquire(a.path(), b.path(), &config).unwrap();
    }

    #[test]
    fn lock_file_records_owner_pid() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();

        let handle = acquire(a.path(), b.path(), &fast_config()).unwrap();

        let content = std::fs::read_to_string(handle.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn different_pairs_do_not_contend() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let c = tempdir().unwrap();
        let config = fast_config();

        let _first = acquire(a.path(), b.path(), &config).unwrap();
        let _second = acquire(a.path(), c.path(), &config).unwrap();
    }
}
