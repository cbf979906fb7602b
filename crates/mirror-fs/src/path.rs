//! Tree-relative path handling for cross-platform inventories
//!
//! Inventory entries are keyed by their path relative to the tree root,
//! normalized to forward slashes on every platform. Normalized paths sort
//! so that a directory always precedes its descendants, which the diff
//! and apply stages rely on.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path relative to a tree root, normalized to forward slashes.
///
/// Converted to platform-native form only at I/O boundaries via
/// [`RelativePath::to_native`]. Ordering is plain byte order on the
/// normalized string, so `"sub"` sorts before `"sub/b.txt"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath {
    inner: String,
}

impl RelativePath {
    /// Build a normalized relative path from a path-like input.
    ///
    /// Rejects absolute paths and any `..` component: inventory paths
    /// must never address anything outside their tree root.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(Error::UnsupportedComponent {
                        path: path.to_path_buf(),
                    });
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::NotRelative {
                        path: path.to_path_buf(),
                    });
                }
            }
        }
        Ok(Self {
            inner: parts.join("/"),
        })
    }

    /// Get the normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native path rooted at `root`.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for part in self.inner.split('/') {
            if !part.is_empty() {
                out.push(part);
            }
        }
        out
    }

    /// Join a single name onto this path.
    pub fn join(&self, name: &str) -> Self {
        if self.inner.is_empty() {
            Self {
                inner: name.to_string(),
            }
        } else {
            Self {
                inner: format!("{}/{}", self.inner, name),
            }
        }
    }

    /// The parent path, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        self.inner.rfind('/').map(|idx| Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// The final name component.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// Whether `self` is a strict ancestor directory of `other`.
    pub fn is_ancestor_of(&self, other: &RelativePath) -> bool {
        other
            .inner
            .strip_prefix(&self.inner)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}
