//! Filesystem primitives for the folder mirroring tool
//!
//! Provides tree-relative path handling, content checksums, and
//! crash-safe copy-into-place operations. Everything here is
//! policy-free; the engine in `mirror-core` decides what to copy
//! and when.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use path::RelativePath;
