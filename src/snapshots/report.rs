// src/snapshots/report.rs
// =============================================================================
// Shared state of the snapshot pass: the report file and the summary.
//
// Both are written by many workers. Each has its own lock, and a worker only
// takes it to append a finished block / entry, never while a request is in
// flight. Blocks are formatted before the lock is taken so they never
// interleave in the file.
// =============================================================================

use super::record::SnapshotRecord;
use crate::error::{HuntError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::io::AsyncWriteExt;
use tracing::error;

pub fn snapshot_report_name(domain: &str) -> String {
    format!("{}.snapshots.txt", domain)
}

/// Final state of one queried URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Resolved { snapshots: usize, skipped: usize },
    NoSnapshots { skipped: usize },
    /// HTTP 429: backed off and dropped for this pass
    RateLimited,
    /// Empty body or an HTML error page
    Invalid,
    Failed { reason: String },
    /// Deadline hit before a worker picked the URL up
    Cancelled,
}

impl SnapshotOutcome {
    pub fn snapshot_count(&self) -> usize {
        match self {
            SnapshotOutcome::Resolved { snapshots, .. } => *snapshots,
            _ => 0,
        }
    }

    pub fn skipped_lines(&self) -> usize {
        match self {
            SnapshotOutcome::Resolved { skipped, .. } | SnapshotOutcome::NoSnapshots { skipped } => {
                *skipped
            }
            _ => 0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            SnapshotOutcome::Resolved { snapshots, .. } => format!("{} snapshots", snapshots),
            SnapshotOutcome::NoSnapshots { .. } => "no snapshots".to_string(),
            SnapshotOutcome::RateLimited => "rate limited".to_string(),
            SnapshotOutcome::Invalid => "invalid response".to_string(),
            SnapshotOutcome::Failed { reason } => format!("failed: {}", reason),
            SnapshotOutcome::Cancelled => "cancelled".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummaryEntry {
    pub url: String,
    #[serde(flatten)]
    pub outcome: SnapshotOutcome,
}

/// Per-URL results, one slot per queue position
#[derive(Debug, Default)]
pub struct SnapshotSummary {
    entries: Mutex<Vec<Option<SnapshotSummaryEntry>>>,
}

impl SnapshotSummary {
    /// `capacity` is the queue length; later positions still fit
    pub fn with_capacity(capacity: usize) -> Self {
        SnapshotSummary {
            entries: Mutex::new(vec![None; capacity]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Option<SnapshotSummaryEntry>>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// First outcome for a position wins
    pub fn record(&self, position: usize, entry: SnapshotSummaryEntry) -> bool {
        let mut entries = self.lock();
        if entries.len() <= position {
            entries.resize(position + 1, None);
        }
        if entries[position].is_some() {
            return false;
        }
        entries[position] = Some(entry);
        true
    }

    pub fn is_recorded(&self, position: usize) -> bool {
        matches!(self.lock().get(position), Some(Some(_)))
    }

    /// Entries in queue order
    pub fn snapshot(&self) -> Vec<SnapshotSummaryEntry> {
        self.lock().iter().flatten().cloned().collect()
    }
}

/// Append-only `<domain>.snapshots.txt`
#[derive(Debug)]
pub struct SnapshotReport {
    path: PathBuf,
    file: tokio::sync::Mutex<tokio::fs::File>,
    failed_writes: Mutex<usize>,
}

impl SnapshotReport {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|e| HuntError::persistence(path, e))?;
        Ok(SnapshotReport {
            path: path.to_path_buf(),
            file: tokio::sync::Mutex::new(file),
            failed_writes: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one whole block. A failed write is logged and counted, not
    /// returned: one bad append must not stop the other workers.
    pub async fn append(&self, block: &str) {
        let result = {
            let mut file = self.file.lock().await;
            match file.write_all(block.as_bytes()).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = result {
            error!(path = %self.path.display(), error = %e, "failed to append snapshot block");
            *self.failed_writes.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        }
    }

    pub fn failed_writes(&self) -> usize {
        *self.failed_writes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub fn format_snapshot_block(url: &str, records: &[SnapshotRecord]) -> String {
    let mut block = format!("Snapshots for URL: {}\n", url);
    for record in records {
        block.push_str(&format!(
            "  - Timestamp: {}\n    URL: {}\n",
            record.display_time(),
            record.replay_url
        ));
    }
    block
}

pub fn format_empty_block(url: &str) -> String {
    format!("No snapshots found for URL: {}\n\n", url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshots::record::{parse_line, LineOutcome};

    fn record(ts: &str) -> SnapshotRecord {
        match parse_line("https://web.archive.org", &format!("{} http://a.com/x.pdf", ts)) {
            LineOutcome::Record(r) => r,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_block_format() {
        let block = format_snapshot_block("http://a.com/x.pdf", &[record("20200102030405")]);
        assert_eq!(
            block,
            "Snapshots for URL: http://a.com/x.pdf\n  - Timestamp: 02 January 2020, 03:04:05\n    URL: https://web.archive.org/web/20200102030405/http://a.com/x.pdf\n"
        );
    }

    #[test]
    fn test_summary_in_queue_order() {
        let summary = SnapshotSummary::with_capacity(2);
        summary.record(
            2,
            SnapshotSummaryEntry {
                url: "c".into(),
                outcome: SnapshotOutcome::RateLimited,
            },
        );
        summary.record(
            0,
            SnapshotSummaryEntry {
                url: "a".into(),
                outcome: SnapshotOutcome::Invalid,
            },
        );
        let urls: Vec<String> = summary.snapshot().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["a", "c"]);
        assert!(!summary.is_recorded(1));
        assert!(!summary.record(
            0,
            SnapshotSummaryEntry {
                url: "a".into(),
                outcome: SnapshotOutcome::Cancelled,
            },
        ));
    }

    #[tokio::test]
    async fn test_report_appends_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(snapshot_report_name("a.com"));
        let report = SnapshotReport::create(&path).await.unwrap();

        report.append(&format_empty_block("http://a.com/1.pdf")).await;
        report.append(&format_empty_block("http://a.com/2.pdf")).await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "No snapshots found for URL: http://a.com/1.pdf\n\nNo snapshots found for URL: http://a.com/2.pdf\n\n"
        );
        assert_eq!(report.failed_writes(), 0);
    }

    #[tokio::test]
    async fn test_report_in_missing_dir_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SnapshotReport::create(&dir.path().join("missing/a.txt")).await;
        assert!(matches!(result, Err(HuntError::Persistence { .. })));
    }
}
