//! Sync cycle controller
//!
//! One cycle is: acquire lock, scan both trees, diff, apply, release,
//! report. This is the unit the external scheduler invokes. The engine
//! holds no state between cycles; an interrupted run simply converges
//! on the next one.

use std::fs;
use std::path::Path;

use crate::apply::{SyncReport, apply};
use crate::config::SyncConfig;
use crate::diff::diff;
use crate::error::{Error, Result};
use crate::lock;
use crate::scan::scan;

/// Run one full sync cycle from `source` to `replica`.
///
/// Creates the replica root if it does not exist yet.
///
/// # Errors
///
/// - [`Error::LockBusy`]: another process holds the pair's lock after
///   the configured retries; the cycle was skipped and nothing was
///   touched.
/// - [`Error::Scan`]: the source (or replica) root became unreadable.
/// - [`Error::ReplicaRoot`]: the replica root could not be created or
///   used.
///
/// Per-file problems never surface as `Err`; they are collected in the
/// returned [`SyncReport`].
pub fn run_one_cycle(source: &Path, replica: &Path, config: &SyncConfig) -> Result<SyncReport> {
    tracing::info!(
        source = %source.display(),
        replica = %replica.display(),
        "starting sync cycle"
    );

    // The replica root must exist before the lock is taken: the lock
    // key canonicalizes both roots, and every invocation has to derive
    // the same key whether or not the replica existed when it started.
    // create_dir_all is idempotent, so racing invocations here cannot
    // conflict.
    if !replica.exists() {
        tracing::warn!(replica = %replica.display(), "replica root missing, creating it");
        fs::create_dir_all(replica).map_err(|e| Error::ReplicaRoot {
            path: replica.to_path_buf(),
            source: e,
        })?;
    }

    // Held for the rest of the cycle; released on drop even when a
    // scan or apply below bails out early.
    let _lock = lock::acquire(source, replica, config)?;

    let source_inventory = scan(source, config)?;
    let replica_inventory = scan(replica, config)?;
    let warnings = source_inventory.warnings().len() + replica_inventory.warnings().len();

    let plan = diff(&source_inventory, &replica_inventory);
    tracing::debug!(
        actions = plan.actions.len(),
        unchanged = plan.unchanged,
        "computed sync plan"
    );

    let mut report = apply(source, replica, &plan)?;
    report.warnings = warnings;

    tracing::info!(
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        errors = report.errors.len(),
        warnings = report.warnings,
        "sync cycle complete"
    );
    Ok(report)
}
