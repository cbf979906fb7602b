//! End-to-end properties of the sync engine
//!
//! Each test exercises a full cycle (or several) against real
//! temporary directory trees and checks the convergence, idempotence,
//! deletion-safety, and lock-exclusivity guarantees.

use std::path::Path;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

use mirror_core::{
    Error, FingerprintMode, SyncConfig, acquire, diff, run_one_cycle, scan,
};

fn fast_config() -> SyncConfig {
    SyncConfig {
        lock_retries: 1,
        lock_backoff_ms: 10,
        ..SyncConfig::default()
    }
}

fn hash_config() -> SyncConfig {
    SyncConfig {
        fingerprint: FingerprintMode::Hash,
        ..fast_config()
    }
}

/// Structural and content equality of two trees, compared through
/// hash-mode scans.
fn assert_trees_equal(a: &Path, b: &Path) {
    let config = hash_config();
    let inv_a = scan(a, &config).unwrap();
    let inv_b = scan(b, &config).unwrap();

    let summarize = |inv: &mirror_core::Inventory| {
        inv.entries()
            .map(|e| (e.path.as_str().to_string(), e.kind, e.fingerprint.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summarize(&inv_a), summarize(&inv_b));
}

#[test]
fn worked_scenario_converges() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("a.txt").write_str("hi").unwrap();
    source.child("sub/b.txt").write_str("yo").unwrap();
    replica.child("a.txt").write_str("old").unwrap();
    replica.child("c.txt").write_str("stale").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &fast_config()).unwrap();

    replica.child("a.txt").assert("hi");
    replica.child("sub/b.txt").assert("yo");
    replica.child("c.txt").assert(predicate::path::missing());
    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 2); // sub/ and sub/b.txt
    assert_eq!(report.deleted, 1);
    assert!(report.errors.is_empty());
    assert_trees_equal(source.path(), replica.path());
}

#[test]
fn converges_from_arbitrary_replica_state() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("keep.txt").write_str("kept").unwrap();
    source.child("deep/a/b/c.txt").write_str("nested").unwrap();
    source.child("deep/a/empty-sibling/.keep").write_str("").unwrap();
    // Replica starts with overlapping, stale, and conflicting content.
    replica.child("keep.txt").write_str("outdated").unwrap();
    replica.child("gone/x.txt").write_str("remove me").unwrap();
    replica.child("gone/y/z.txt").write_str("me too").unwrap();
    // Kind conflict: a file where the source has a directory.
    replica.child("deep").write_str("i am a file").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &fast_config()).unwrap();

    assert!(report.errors.is_empty());
    assert_trees_equal(source.path(), replica.path());
}

#[test]
fn second_cycle_is_an_empty_plan() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("a.txt").write_str("hi").unwrap();
    source.child("sub/b.txt").write_str("yo").unwrap();

    let config = fast_config();
    run_one_cycle(source.path(), replica.path(), &config).unwrap();

    // Timestamp fingerprints must match after the copy (mtime is
    // preserved), so the recomputed plan is empty.
    let plan = diff(
        &scan(source.path(), &config).unwrap(),
        &scan(replica.path(), &config).unwrap(),
    );
    assert!(plan.is_empty());

    let second = run_one_cycle(source.path(), replica.path(), &config).unwrap();
    assert!(second.is_clean_noop());
    assert_eq!(second.unchanged, 3);
}

#[test]
fn idempotent_in_hash_mode_too() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("a.txt").write_str("hi").unwrap();

    let config = hash_config();
    run_one_cycle(source.path(), replica.path(), &config).unwrap();
    let second = run_one_cycle(source.path(), replica.path(), &config).unwrap();

    assert!(second.is_clean_noop());
}

#[test]
fn replica_only_directories_are_deleted_children_first() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    replica.child("old/nested/deeper/f.txt").write_str("x").unwrap();
    replica.child("old/nested/g.txt").write_str("y").unwrap();
    replica.child("old/h.txt").write_str("z").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &fast_config()).unwrap();

    // No ENOTEMPTY-class failures: every directory was empty by the
    // time its delete ran.
    assert!(report.errors.is_empty());
    assert_eq!(report.deleted, 6);
    replica.child("old").assert(predicate::path::missing());
}

#[test]
fn source_file_replacing_replica_directory_converges() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("thing").write_str("now a file").unwrap();
    replica.child("thing/inner/deep.txt").write_str("x").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &fast_config()).unwrap();

    assert!(report.errors.is_empty());
    replica.child("thing").assert("now a file");
    assert_trees_equal(source.path(), replica.path());
}

#[test]
fn concurrent_cycle_is_skipped_with_lock_busy() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("a.txt").write_str("hi").unwrap();
    let config = fast_config();

    // First "process" holds the pair's lock.
    let handle = acquire(source.path(), replica.path(), &config).unwrap();

    let result = run_one_cycle(source.path(), replica.path(), &config);
    assert!(matches!(result, Err(Error::LockBusy { .. })));
    // The losing cycle must not have touched the replica.
    replica.child("a.txt").assert(predicate::path::missing());

    drop(handle);
    let report = run_one_cycle(source.path(), replica.path(), &config).unwrap();
    assert_eq!(report.created, 1);
    replica.child("a.txt").assert("hi");
}

#[test]
fn stale_temp_file_from_a_crashed_copy_is_cleaned_up() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("a.txt").write_str("fresh").unwrap();
    replica.child("a.txt").write_str("prior").unwrap();
    // A crash between temp write and rename leaves this behind; the
    // final path still holds the prior content, never a truncated file.
    replica.child(".a.txt.99999.tmp").write_str("half-wri").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &hash_config()).unwrap();

    assert!(report.errors.is_empty());
    replica.child("a.txt").assert("fresh");
    replica
        .child(".a.txt.99999.tmp")
        .assert(predicate::path::missing());
    assert_trees_equal(source.path(), replica.path());
}

#[test]
fn source_changes_between_cycles_are_picked_up() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    let config = hash_config();
    source.child("a.txt").write_str("v1").unwrap();

    run_one_cycle(source.path(), replica.path(), &config).unwrap();
    replica.child("a.txt").assert("v1");

    source.child("a.txt").write_str("v2").unwrap();
    source.child("new.txt").write_str("brand new").unwrap();

    let report = run_one_cycle(source.path(), replica.path(), &config).unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 1);
    assert_trees_equal(source.path(), replica.path());
}

#[test]
fn scan_warnings_are_counted_in_the_report() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    source.child("ok.txt").write_str("fine").unwrap();

    #[cfg(unix)]
    {
        let outside = TempDir::new().unwrap();
        outside.child("target").write_str("x").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target"),
            source.path().join("escape"),
        )
        .unwrap();

        let report = run_one_cycle(source.path(), replica.path(), &fast_config()).unwrap();
        assert_eq!(report.warnings, 1);
        replica.child("escape").assert(predicate::path::missing());
        replica.child("ok.txt").assert("fine");
    }
}
