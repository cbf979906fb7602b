//! Tracing subscriber setup: console plus append-mode log file
//!
//! The core only emits structured events; this module owns formatting
//! and destinations. Log file rotation is left to external tooling.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber.
///
/// Events go to stderr and, without ANSI colors, to `log_file`
/// (created if missing, appended otherwise). The `RUST_LOG`
/// environment variable overrides the default level, which is `debug`
/// when `verbose` is set and `info` otherwise.
///
/// A subscriber can only be installed once per process; a second call
/// leaves the existing one in place.
pub fn init(log_file: &Path, verbose: bool) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer().with_writer(std::io::stderr).compact();
    let file_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_the_log_file() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("sync.log");

        init(&log_file, false).unwrap();

        assert!(log_file.exists());
    }

    #[test]
    fn init_twice_is_not_an_error() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("sync.log");

        init(&log_file, false).unwrap();
        init(&log_file, true).unwrap();
    }
}
