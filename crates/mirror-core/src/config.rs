//! Engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How file content equality is decided without a byte-for-byte compare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Compare length plus modification time. Fast; relies on the
    /// filesystem reporting stable mtimes.
    #[default]
    Timestamp,
    /// Compare SHA-256 content checksums. Reads every file on every
    /// scan, but is immune to coarse or unreliable mtime resolution.
    Hash,
}

impl std::str::FromStr for FingerprintMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "hash" => Ok(Self::Hash),
            other => Err(format!(
                "unknown fingerprint mode '{other}' (expected 'timestamp' or 'hash')"
            )),
        }
    }
}

/// Configuration for one sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Content-equality mode used by the scanner.
    pub fingerprint: FingerprintMode,
    /// How many times lock acquisition is retried before the cycle is
    /// skipped with a lock-busy error.
    pub lock_retries: u32,
    /// Initial backoff between lock acquisition attempts, in
    /// milliseconds. Grows exponentially up to the retry budget.
    pub lock_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fingerprint: FingerprintMode::default(),
            lock_retries: 3,
            lock_backoff_ms: 250,
        }
    }
}

impl SyncConfig {
    /// The initial lock retry backoff as a `Duration`.
    pub fn lock_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_backoff_ms)
    }

    /// Upper bound on total time spent retrying lock acquisition.
    pub fn lock_retry_budget(&self) -> Duration {
        self.lock_backoff() * self.lock_retries.max(1)
    }
}
