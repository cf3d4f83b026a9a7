// src/snapshots/mod.rs
// =============================================================================
// Optional second pass: for URLs saved by a scan, find every capture the
// archive holds and write them to `<domain>.snapshots.txt`.
//
// Submodules:
// - record: decoding of `timestamp original` lines
// - report: the shared report file and per-URL summary
// - resolve: the worker pool
// =============================================================================

mod record;
mod report;
mod resolve;

pub use report::{snapshot_report_name, SnapshotOutcome};
pub use resolve::{resolve_snapshots, SnapshotOptions, SnapshotRunReport};
