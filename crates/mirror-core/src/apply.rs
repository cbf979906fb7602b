//! Sync applier
//!
//! Executes a [`SyncPlan`] against the filesystem, strictly in plan
//! order and sequentially: later actions (deleting a now-empty
//! directory) depend on earlier ones having completed.
//!
//! A single action's failure is recorded in the report and the run
//! continues; one bad file must not abort an otherwise-successful
//! cycle. Only an inaccessible replica root prevents apply from
//! starting at all.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diff::{SyncAction, SyncPlan};
use crate::error::{Error, Result};

/// A single failed action, kept as data in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ActionError {
    pub action: SyncAction,
    pub cause: String,
}

/// Summary of one cycle: what changed, what failed, what was skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub errors: Vec<ActionError>,
    /// Scan warnings carried over from both tree scans.
    pub warnings: usize,
}

impl SyncReport {
    /// Whether the cycle changed nothing and hit no errors.
    pub fn is_clean_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0 && self.errors.is_empty()
    }
}

/// Execute `plan` against `replica_root`, copying content from
/// `source_root`.
///
/// # Errors
///
/// Returns [`Error::ReplicaRoot`] if the replica root itself is missing
/// or inaccessible. Per-action failures never produce an `Err`.
pub fn apply(source_root: &Path, replica_root: &Path, plan: &SyncPlan) -> Result<SyncReport> {
    match fs::metadata(replica_root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(Error::ReplicaRoot {
                path: replica_root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "replica root is not a directory",
                ),
            });
        }
        Err(e) => {
            return Err(Error::ReplicaRoot {
                path: replica_root.to_path_buf(),
                source: e,
            });
        }
    }

    let mut report = SyncReport {
        unchanged: plan.unchanged,
        ..SyncReport::default()
    };

    for action in &plan.actions {
        match execute(source_root, replica_root, action) {
            Ok(()) => {
                tracing::info!(path = %action.path(), "{action}");
                match action {
                    SyncAction::CreateDir(_) | SyncAction::CopyFile(_) => report.created += 1,
                    SyncAction::UpdateFile(_) => report.updated += 1,
                    SyncAction::DeleteFile(_) | SyncAction::DeleteDir(_) => report.deleted += 1,
                }
            }
            Err(cause) => {
                tracing::warn!(path = %action.path(), %cause, "failed to {action}");
                report.errors.push(ActionError {
                    action: action.clone(),
                    cause: cause.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Execute one action. Copies go through the atomic temp-then-rename
/// path in mirror-fs. Directory deletion is non-recursive: a directory
/// that turns out non-empty (an out-of-band write) is an error, never
/// forced.
fn execute(source_root: &Path, replica_root: &Path, action: &SyncAction) -> Result<()> {
    match action {
        SyncAction::CreateDir(path) => {
            fs::create_dir_all(path.to_native(replica_root))?;
        }
        SyncAction::CopyFile(path) | SyncAction::UpdateFile(path) => {
            mirror_fs::io::copy_atomic(
                &path.to_native(source_root),
                &path.to_native(replica_root),
            )?;
        }
        SyncAction::DeleteFile(path) => {
            fs::remove_file(path.to_native(replica_root))?;
        }
        SyncAction::DeleteDir(path) => {
            fs::remove_dir(path.to_native(replica_root))?;
        }
    }
    Ok(())
}
