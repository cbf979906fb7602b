//! Tree scanner
//!
//! Walks a directory tree with an explicit worklist (no recursion, so
//! arbitrarily deep trees cannot overflow the stack) and produces a
//! normalized [`Inventory`].
//!
//! Symbolic link policy: a link is resolved and treated as its target
//! kind when the target lies inside the scanned root. Link targets
//! outside the root, broken links, and links that would revisit an
//! already-walked directory (a loop) are skipped with a warning. Links
//! are never followed outside the root.
//!
//! An unreadable root is fatal; unreadable children become warnings and
//! are excluded from the inventory.

use std::collections::{HashSet, VecDeque};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use mirror_fs::RelativePath;

use crate::config::{FingerprintMode, SyncConfig};
use crate::error::{Error, Result};
use crate::inventory::{Fingerprint, Inventory, InventoryEntry};

/// Scan the tree rooted at `root` into an inventory.
///
/// # Errors
///
/// Returns [`Error::Scan`] if the root itself is missing or unreadable.
pub fn scan(root: &Path, config: &SyncConfig) -> Result<Inventory> {
    let canonical_root = dunce::canonicalize(root).map_err(|e| Error::scan(root, e))?;

    let mut inventory = Inventory::default();
    // Canonical paths of every directory already queued; guards against
    // symlink loops and double-walking a directory reachable two ways.
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(canonical_root.clone());

    let mut worklist: VecDeque<(PathBuf, Option<RelativePath>)> = VecDeque::new();
    worklist.push_back((root.to_path_buf(), None));

    while let Some((dir, rel)) = worklist.pop_front() {
        let reader = match fs::read_dir(&dir) {
            Ok(reader) => reader,
            Err(e) if rel.is_none() => return Err(Error::scan(&dir, e)),
            Err(e) => {
                inventory.warn(&dir, format!("unreadable directory: {e}"));
                continue;
            }
        };

        for entry in reader {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    inventory.warn(&dir, format!("unreadable entry: {e}"));
                    continue;
                }
            };
            let path = entry.path();
            // A lossy name would make the replica-side copy target a
            // different file than the one scanned, so non-UTF-8 names
            // are excluded instead.
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => {
                    inventory.warn(&path, "non-UTF-8 name cannot be mirrored, skipping");
                    continue;
                }
            };
            let rel_path = match &rel {
                Some(parent) => parent.join(&name),
                None => match RelativePath::new(&name) {
                    Ok(rel_path) => rel_path,
                    Err(e) => {
                        inventory.warn(&path, format!("unusable name: {e}"));
                        continue;
                    }
                },
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    inventory.warn(&path, format!("unreadable entry: {e}"));
                    continue;
                }
            };

            if file_type.is_symlink() {
                visit_symlink(
                    &path,
                    rel_path,
                    &canonical_root,
                    &mut visited,
                    &mut worklist,
                    &mut inventory,
                    config,
                );
            } else if file_type.is_dir() {
                match dunce::canonicalize(&path) {
                    Ok(canonical) => {
                        if visited.insert(canonical) {
                            inventory.insert(InventoryEntry::directory(rel_path.clone()));
                            worklist.push_back((path, Some(rel_path)));
                        } else {
                            inventory.warn(&path, "directory already visited, skipping");
                        }
                    }
                    Err(e) => {
                        inventory.warn(&path, format!("unreadable directory: {e}"));
                    }
                }
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => visit_file(&path, rel_path, &meta, &mut inventory, config),
                    Err(e) => {
                        inventory.warn(&path, format!("unreadable file: {e}"));
                    }
                }
            } else {
                // Sockets, fifos, devices: not mirrorable content.
                inventory.warn(&path, "unsupported file type, skipping");
            }
        }
    }

    Ok(inventory)
}

/// Inventory a regular file, computing its fingerprint per config.
fn visit_file(
    path: &Path,
    rel_path: RelativePath,
    meta: &Metadata,
    inventory: &mut Inventory,
    config: &SyncConfig,
) {
    let fingerprint = match config.fingerprint {
        FingerprintMode::Timestamp => match meta.modified() {
            Ok(mtime) => Fingerprint::Timestamp {
                len: meta.len(),
                mtime,
            },
            Err(e) => {
                inventory.warn(path, format!("no modification time: {e}"));
                return;
            }
        },
        FingerprintMode::Hash => match mirror_fs::checksum::compute_file_checksum(path) {
            Ok(checksum) => Fingerprint::Hash(checksum),
            Err(e) => {
                inventory.warn(path, format!("unreadable file: {e}"));
                return;
            }
        },
    };
    inventory.insert(InventoryEntry::file(rel_path, meta.len(), fingerprint));
}

/// Apply the symlink policy to one link entry.
fn visit_symlink(
    path: &Path,
    rel_path: RelativePath,
    canonical_root: &Path,
    visited: &mut HashSet<PathBuf>,
    worklist: &mut VecDeque<(PathBuf, Option<RelativePath>)>,
    inventory: &mut Inventory,
    config: &SyncConfig,
) {
    let target = match dunce::canonicalize(path) {
        Ok(target) => target,
        Err(e) => {
            inventory.warn(path, format!("broken symlink: {e}"));
            return;
        }
    };
    if !target.starts_with(canonical_root) {
        inventory.warn(path, "symlink target outside tree root, skipping");
        return;
    }
    if target.is_dir() {
        if visited.insert(target) {
            inventory.insert(InventoryEntry::directory(rel_path.clone()));
            worklist.push_back((path.to_path_buf(), Some(rel_path)));
        } else {
            inventory.warn(path, "symlink loop detected, skipping");
        }
    } else {
        match fs::metadata(path) {
            Ok(meta) => visit_file(path, rel_path, &meta, inventory, config),
            Err(e) => {
                inventory.warn(path, format!("unreadable symlink target: {e}"));
            }
        }
    }
}
