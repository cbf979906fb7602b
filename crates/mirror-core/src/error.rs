//! Error types for mirror-core
//!
//! Only two conditions end a cycle early: an unreadable root (`Scan`,
//! `ReplicaRoot`) and lock contention (`LockBusy`). Everything else —
//! unreadable children, individual failed copies or deletes — is
//! collected as data in the `Inventory` warnings or the `SyncReport`
//! error list so the daemon keeps running.

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tree root itself could not be read; fatal to the cycle.
    #[error("Cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the lock for this (source, replica) pair.
    #[error("Another sync is in progress (lock held at {path})")]
    LockBusy { path: PathBuf },

    /// The replica root is missing or inaccessible; apply cannot start.
    #[error("Replica root {path} is not usable: {source}")]
    ReplicaRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }
}
