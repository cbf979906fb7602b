//! Diff engine
//!
//! Pure merge-walk over two inventories; no I/O. Produces the ordered
//! [`SyncPlan`] that converges the replica to the source.
//!
//! Plan ordering:
//!
//! 1. Deletions forced by kind mismatches (a replica file where the
//!    source has a directory, or vice versa), descendant-first, so the
//!    obsolete replica entry and everything beneath it is gone before
//!    its replacement is created.
//! 2. Creates and updates, ascending by path, so every directory is
//!    created before its contents.
//! 3. Remaining deletions, descendant-first (reverse path order), so a
//!    directory is removed only after everything inside it.

use serde::Serialize;

use mirror_fs::RelativePath;

use crate::inventory::{EntryKind, Inventory, InventoryEntry};

/// One filesystem operation in a sync plan.
///
/// Consumed exactly once by the applier, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "path", rename_all = "snake_case")]
pub enum SyncAction {
    CreateDir(RelativePath),
    CopyFile(RelativePath),
    UpdateFile(RelativePath),
    DeleteFile(RelativePath),
    DeleteDir(RelativePath),
}

impl SyncAction {
    pub fn path(&self) -> &RelativePath {
        match self {
            Self::CreateDir(path)
            | Self::CopyFile(path)
            | Self::UpdateFile(path)
            | Self::DeleteFile(path)
            | Self::DeleteDir(path) => path,
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir(path) => write!(f, "create directory {path}"),
            Self::CopyFile(path) => write!(f, "copy file {path}"),
            Self::UpdateFile(path) => write!(f, "update file {path}"),
            Self::DeleteFile(path) => write!(f, "delete file {path}"),
            Self::DeleteDir(path) => write!(f, "delete directory {path}"),
        }
    }
}

/// The ordered actions for one cycle, plus the unchanged-entry count.
///
/// Owned by one cycle; never persisted. Every cycle recomputes its plan
/// from fresh scans.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
    /// Entries present and equal on both sides.
    pub unchanged: usize,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Compute the plan that converges `replica` to `source`.
pub fn diff(source: &Inventory, replica: &Inventory) -> SyncPlan {
    let mut builds: Vec<SyncAction> = Vec::new();
    // Deletions in ascending path order; reversed on assembly so
    // descendants are deleted before their parent directory.
    let mut replace_deletes: Vec<SyncAction> = Vec::new();
    let mut deletes: Vec<SyncAction> = Vec::new();
    // Replica directories being destructively replaced by a source
    // file; their descendants must be deleted up front too.
    let mut replaced_dirs: Vec<RelativePath> = Vec::new();
    let mut unchanged = 0usize;

    let mut source_iter = source.entries().peekable();
    let mut replica_iter = replica.entries().peekable();

    loop {
        match (source_iter.peek(), replica_iter.peek()) {
            (Some(src), Some(rep)) => match src.path.cmp(&rep.path) {
                std::cmp::Ordering::Less => {
                    builds.push(create_action(src));
                    source_iter.next();
                }
                std::cmp::Ordering::Greater => {
                    let action = delete_action(rep);
                    if under_replaced_dir(&replaced_dirs, &rep.path) {
                        replace_deletes.push(action);
                    } else {
                        deletes.push(action);
                    }
                    replica_iter.next();
                }
                std::cmp::Ordering::Equal => {
                    match (src.kind, rep.kind) {
                        (EntryKind::Directory, EntryKind::Directory) => unchanged += 1,
                        (EntryKind::File, EntryKind::File) => {
                            if src.fingerprint == rep.fingerprint {
                                unchanged += 1;
                            } else {
                                builds.push(SyncAction::UpdateFile(src.path.clone()));
                            }
                        }
                        // Kind mismatch: the replica entry is obsolete.
                        // Delete it (and, for a directory, its subtree)
                        // before the replacement is created.
                        (EntryKind::File, EntryKind::Directory) => {
                            replaced_dirs.push(rep.path.clone());
                            replace_deletes.push(SyncAction::DeleteDir(rep.path.clone()));
                            builds.push(SyncAction::CopyFile(src.path.clone()));
                        }
                        (EntryKind::Directory, EntryKind::File) => {
                            replace_deletes.push(SyncAction::DeleteFile(rep.path.clone()));
                            builds.push(SyncAction::CreateDir(src.path.clone()));
                        }
                    }
                    source_iter.next();
                    replica_iter.next();
                }
            },
            (Some(src), None) => {
                builds.push(create_action(src));
                source_iter.next();
            }
            (None, Some(rep)) => {
                let action = delete_action(rep);
                if under_replaced_dir(&replaced_dirs, &rep.path) {
                    replace_deletes.push(action);
                } else {
                    deletes.push(action);
                }
                replica_iter.next();
            }
            (None, None) => break,
        }
    }

    replace_deletes.reverse();
    deletes.reverse();

    let mut actions = replace_deletes;
    actions.append(&mut builds);
    actions.append(&mut deletes);

    SyncPlan { actions, unchanged }
}

fn create_action(entry: &InventoryEntry) -> SyncAction {
    match entry.kind {
        EntryKind::Directory => SyncAction::CreateDir(entry.path.clone()),
        EntryKind::File => SyncAction::CopyFile(entry.path.clone()),
    }
}

fn delete_action(entry: &InventoryEntry) -> SyncAction {
    match entry.kind {
        EntryKind::Directory => SyncAction::DeleteDir(entry.path.clone()),
        EntryKind::File => SyncAction::DeleteFile(entry.path.clone()),
    }
}

fn under_replaced_dir(replaced: &[RelativePath], path: &RelativePath) -> bool {
    replaced.iter().any(|dir| dir.is_ancestor_of(path))
}
