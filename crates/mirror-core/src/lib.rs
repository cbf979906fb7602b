//! Synchronization engine for the folder mirroring tool
//!
//! One cycle converges a replica directory tree to a source tree:
//!
//! ```text
//!   lock -> scan source -> scan replica -> diff -> apply -> report
//! ```
//!
//! The stages are independent and composable:
//!
//! - **[`scan`]**: walks a tree into a normalized [`Inventory`]
//! - **[`diff`]**: merge-walks two inventories into an ordered [`SyncPlan`]
//! - **[`apply`]**: executes the plan, tolerating per-action failures
//! - **[`lock`]**: cross-process exclusion per (source, replica) pair
//! - **[`cycle`]**: orchestrates one full run for the scheduler
//!
//! The engine is stateless across cycles: every run re-scans both trees
//! and recomputes the plan from scratch, so an interrupted cycle simply
//! converges on the next run.

pub mod apply;
pub mod config;
pub mod cycle;
pub mod diff;
pub mod error;
pub mod inventory;
pub mod lock;
pub mod scan;

pub use apply::{ActionError, SyncReport, apply};
pub use config::{FingerprintMode, SyncConfig};
pub use cycle::run_one_cycle;
pub use diff::{SyncAction, SyncPlan, diff};
pub use error::{Error, Result};
pub use inventory::{EntryKind, Fingerprint, Inventory, InventoryEntry, ScanWarning};
pub use lock::{LockHandle, acquire};
pub use scan::scan;
