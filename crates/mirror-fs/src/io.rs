//! Crash-safe copy operations
//!
//! Uses the write-to-temp-then-rename strategy: content lands in a
//! temporary file beside the destination (same directory, so the rename
//! never crosses a filesystem) and is renamed into place only after a
//! successful flush. A crash mid-copy leaves at worst a stale `.tmp`
//! file, never a truncated file at the final path.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Build the temporary path used while copying into `dest`.
///
/// The process id in the name keeps concurrent writers from different
/// processes off each other's temp files.
fn temp_path_for(dest: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        dest.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    dest.with_file_name(temp_name)
}

/// Copy `src` to `dest` atomically, preserving the source's mtime.
///
/// The destination's parent directory must already exist. On success the
/// destination carries the source file's modification time, so
/// timestamp-based fingerprints of the two files compare equal.
///
/// Returns the number of bytes copied.
pub fn copy_atomic(src: &Path, dest: &Path) -> Result<u64> {
    let src_meta = fs::metadata(src).map_err(|e| Error::io(src, e))?;
    let mut reader = File::open(src).map_err(|e| Error::io(src, e))?;

    let temp_path = temp_path_for(dest);
    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        let bytes = std::io::copy(&mut reader, &mut temp_file)
            .map_err(|e| Error::io(&temp_path, e))?;

        if let Ok(mtime) = src_meta.modified() {
            temp_file
                .set_modified(mtime)
                .map_err(|e| Error::io(&temp_path, e))?;
        }

        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

        fs::rename(&temp_path, dest).map_err(|e| Error::io(dest, e))?;
        Ok(bytes)
    })();

    if result.is_err() {
        // Best effort: a leftover temp file is harmless but untidy.
        let _ = fs::remove_file(&temp_path);
    }
    result
}
