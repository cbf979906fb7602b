//! Point-in-time inventories of a directory tree
//!
//! An [`Inventory`] is a normalized listing of one tree root at one
//! instant: one [`InventoryEntry`] per filesystem object, keyed by
//! tree-relative path. Inventories are created fresh by every scan and
//! discarded once the cycle's diff is computed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use mirror_fs::RelativePath;

/// The kind of a mirrored filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A value deciding file content equality without a byte compare.
///
/// Both sides of a diff are always scanned with the same mode, so
/// variants never mix in practice; a mixed compare is simply unequal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// File length plus modification time.
    Timestamp { len: u64, mtime: SystemTime },
    /// Canonical `sha256:<hex>` content checksum.
    Hash(String),
}

/// One filesystem object in an inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// Path relative to the scanned root.
    pub path: RelativePath,
    pub kind: EntryKind,
    /// File length in bytes; zero for directories.
    pub len: u64,
    /// Content fingerprint; present for files only.
    pub fingerprint: Option<Fingerprint>,
}

impl InventoryEntry {
    pub fn directory(path: RelativePath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            len: 0,
            fingerprint: None,
        }
    }

    pub fn file(path: RelativePath, len: u64, fingerprint: Fingerprint) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            len,
            fingerprint: Some(fingerprint),
        }
    }
}

/// A non-fatal problem encountered during a scan.
///
/// The affected entry is excluded from the inventory. Excluding an
/// unreadable source file means it is never treated as "absent from
/// the source" and synced away destructively.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Ordered-by-path listing of one tree root at one instant.
///
/// Iteration order is ascending by relative path, which places every
/// directory before its descendants. The diff engine depends on that
/// ordering.
#[derive(Debug, Default)]
pub struct Inventory {
    entries: BTreeMap<RelativePath, InventoryEntry>,
    warnings: Vec<ScanWarning>,
}

impl Inventory {
    pub fn insert(&mut self, entry: InventoryEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Record a non-fatal scan problem.
    pub fn warn(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        let warning = ScanWarning {
            path: path.into(),
            message: message.into(),
        };
        tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn get(&self, path: &RelativePath) -> Option<&InventoryEntry> {
        self.entries.get(path)
    }

    /// Entries in ascending path order, directories before descendants.
    pub fn entries(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.values()
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
