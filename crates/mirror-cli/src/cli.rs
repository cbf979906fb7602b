//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

use mirror_core::FingerprintMode;

/// Folder Mirror - periodically mirror a source folder onto a replica
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source folder path (authoritative)
    pub source: PathBuf,

    /// Replica folder path (kept identical to the source)
    pub replica: PathBuf,

    /// Seconds between sync cycles
    pub interval: u64,

    /// Log file path (appended; console output is mirrored there)
    pub log_file: PathBuf,

    /// How file content equality is decided: 'timestamp' compares
    /// length plus mtime, 'hash' compares SHA-256 checksums
    #[arg(long, default_value = "timestamp")]
    pub fingerprint: FingerprintMode,

    /// Lock acquisition retries before a cycle is skipped
    #[arg(long, default_value_t = 3)]
    pub lock_retries: u32,

    /// Initial backoff between lock retries, in milliseconds
    #[arg(long, default_value_t = 250)]
    pub lock_backoff_ms: u64,

    /// Run a single cycle and exit instead of looping
    #[arg(long)]
    pub once: bool,

    /// Print each cycle's report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
