//! Folder Mirror CLI
//!
//! Validates the folder pair, sets up logging, and invokes one sync
//! cycle every interval until terminated. All synchronization logic
//! lives in mirror-core; this binary is scheduling and wiring.

mod cli;
mod error;
mod logging;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use mirror_core::{SyncConfig, run_one_cycle};

use cli::Cli;
use error::{CliError, Result};

/// Exit code when a single `--once` cycle was skipped on lock contention.
const EXIT_LOCK_BUSY: i32 = 2;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    logging::init(&cli.log_file, cli.verbose)?;

    if !cli.source.is_dir() {
        return Err(CliError::user(format!(
            "source folder '{}' does not exist",
            cli.source.display()
        )));
    }
    if cli.source == cli.replica {
        return Err(CliError::user(
            "source and replica must be different folders",
        ));
    }

    let config = SyncConfig {
        fingerprint: cli.fingerprint,
        lock_retries: cli.lock_retries,
        lock_backoff_ms: cli.lock_backoff_ms,
    };

    loop {
        match run_one_cycle(&cli.source, &cli.replica, &config) {
            Ok(report) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&report)?);
                }
            }
            Err(e @ mirror_core::Error::LockBusy { .. }) => {
                tracing::warn!("cycle skipped: {e}");
                if cli.once {
                    return Ok(EXIT_LOCK_BUSY);
                }
            }
            Err(e) => {
                if cli.once {
                    return Err(e.into());
                }
                // The daemon keeps running; a persistent failure shows
                // up as a repeating error line, not a dead process.
                tracing::error!("sync cycle failed: {e}");
            }
        }

        if cli.once {
            return Ok(0);
        }
        std::thread::sleep(Duration::from_secs(cli.interval));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn once_cli(source: &std::path::Path, replica: &std::path::Path, log: &std::path::Path) -> Cli {
        Cli::parse_from([
            "mirror",
            source.to_str().unwrap(),
            replica.to_str().unwrap(),
            "1",
            log.to_str().unwrap(),
            "--once",
        ])
    }

    #[test]
    fn once_mode_mirrors_and_exits_zero() {
        let source = tempdir().unwrap();
        let replica = tempdir().unwrap();
        let logs = tempdir().unwrap();
        fs::write(source.path().join("a.txt"), "hi").unwrap();

        let code = run(once_cli(
            source.path(),
            replica.path(),
            &logs.path().join("sync.log"),
        ))
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            fs::read_to_string(replica.path().join("a.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn missing_source_is_a_startup_error() {
        let dir = tempdir().unwrap();
        let replica = tempdir().unwrap();
        let logs = tempdir().unwrap();

        let result = run(once_cli(
            &dir.path().join("absent"),
            replica.path(),
            &logs.path().join("sync.log"),
        ));

        assert!(matches!(result, Err(CliError::User { .. })));
    }

    #[test]
    fn same_source_and_replica_is_rejected() {
        let dir = tempdir().unwrap();
        let logs = tempdir().unwrap();

        let result = run(once_cli(
            dir.path(),
            dir.path(),
            &logs.path().join("sync.log"),
        ));

        assert!(matches!(result, Err(CliError::User { .. })));
    }
}
