// src/snapshots/resolve.rs
// =============================================================================
// The snapshot pass: a fixed pool of workers pulls URLs off a bounded queue
// and asks the archive for every capture of each one.
//
// Per URL:
//   Pending -> Requesting -> Parsed | RateLimited | Invalid | Failed -> Done
//
// - 429: the worker backs off, then drops the URL for this pass. It is not
//   requeued; the summary marks it as rate limited.
// - Non-200 / transport error: nothing is written for the URL.
// - Empty body or HTML page: treated as "no snapshots".
// - Each worker pauses between requests even when nothing went wrong, so we
//   stay under the archive's radar.
//
// The pass never fails as a whole. When the deadline (or the caller's
// cancellation token) fires, workers stop picking up new URLs; a request
// already in flight finishes under its own timeout.
// =============================================================================

use super::record::{parse_body, LineOutcome, SnapshotRecord};
use super::report::{
    format_empty_block, format_snapshot_block, SnapshotOutcome, SnapshotReport, SnapshotSummary,
    SnapshotSummaryEntry,
};
use crate::archive::snapshot_query_url;
use crate::config::DEFAULT_NUM_WORKERS;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Knobs for one snapshot pass
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub archive_base: String,
    pub workers: usize,
    /// Pause after every request, per worker
    pub courtesy_delay: Duration,
    /// Pause after a 429 before the worker moves on
    pub rate_limit_backoff: Duration,
    /// Overall budget for the pass
    pub deadline: Option<Duration>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            archive_base: crate::archive::DEFAULT_ARCHIVE_BASE.to_string(),
            workers: DEFAULT_NUM_WORKERS,
            courtesy_delay: Duration::from_secs(2),
            rate_limit_backoff: Duration::from_secs(10),
            deadline: None,
        }
    }
}

/// Result of the whole pass
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRunReport {
    pub entries: Vec<SnapshotSummaryEntry>,
    /// Where the report was written, if it could be created
    pub report_path: Option<PathBuf>,
    /// Why the report file is missing or incomplete
    pub report_error: Option<String>,
}

impl SnapshotRunReport {
    pub fn total_snapshots(&self) -> usize {
        self.entries.iter().map(|e| e.outcome.snapshot_count()).sum()
    }

    pub fn skipped_lines(&self) -> usize {
        self.entries.iter().map(|e| e.outcome.skipped_lines()).sum()
    }

    pub fn count_where(&self, pred: impl Fn(&SnapshotOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

struct Shared {
    client: Client,
    options: SnapshotOptions,
    summary: SnapshotSummary,
    report: Option<SnapshotReport>,
    cancel: CancellationToken,
}

/// Resolves snapshots for `urls`, writing blocks to `report_path`.
///
/// Empty entries are ignored. The returned entries follow the input order.
pub async fn resolve_snapshots(
    client: &Client,
    urls: Vec<String>,
    report_path: PathBuf,
    options: SnapshotOptions,
    cancel: CancellationToken,
) -> SnapshotRunReport {
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    let (report, report_error) = match SnapshotReport::create(&report_path).await {
        Ok(report) => (Some(report), None),
        Err(e) => {
            warn!(error = %e, "snapshot report unavailable, continuing with the summary only");
            (None, Some(e.to_string()))
        }
    };

    let cancel = cancel.child_token();
    let workers = options.workers.max(1);
    if let Some(deadline) = options.deadline {
        let timer = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    info!("snapshot deadline reached, no new URLs will be started");
                    timer.cancel();
                }
                _ = timer.cancelled() => {}
            }
        });
    }

    let shared = Arc::new(Shared {
        client: client.clone(),
        options,
        summary: SnapshotSummary::with_capacity(urls.len()),
        report,
        cancel: cancel.clone(),
    });

    info!(urls = urls.len(), workers, "starting snapshot pass");

    let (tx, rx) = mpsc::channel::<(usize, String)>(workers);
    let rx = Arc::new(Mutex::new(rx));

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let shared = shared.clone();
            let rx = rx.clone();
            tokio::spawn(worker(id, shared, rx))
        })
        .collect();

    for (position, url) in urls.iter().cloned().enumerate() {
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = tx.send((position, url)) => result.is_ok(),
        };
        if !sent {
            break;
        }
    }
    drop(tx);

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "snapshot worker ended abnormally");
        }
    }
    // stops the deadline timer
    cancel.cancel();

    // Anything never picked up (deadline, dead worker) is reported as cancelled
    for (position, url) in urls.into_iter().enumerate() {
        if !shared.summary.is_recorded(position) {
            shared.summary.record(
                position,
                SnapshotSummaryEntry {
                    url,
                    outcome: SnapshotOutcome::Cancelled,
                },
            );
        }
    }

    let report_error = match (&shared.report, report_error) {
        (_, Some(e)) => Some(e),
        (Some(report), None) if report.failed_writes() > 0 => Some(format!(
            "{} block(s) could not be written to {}",
            report.failed_writes(),
            report.path().display()
        )),
        _ => None,
    };

    SnapshotRunReport {
        entries: shared.summary.snapshot(),
        report_path: shared.report.as_ref().map(|r| r.path().to_path_buf()),
        report_error,
    }
}

async fn worker(id: usize, shared: Arc<Shared>, rx: Arc<Mutex<mpsc::Receiver<(usize, String)>>>) {
    loop {
        if shared.cancel.is_cancelled() {
            break;
        }
        // the queue lock is released before any network call
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => None,
                item = rx.recv() => item,
            }
        };
        let Some((position, url)) = next else {
            break;
        };

        debug!(worker = id, %url, "requesting snapshots");
        let (outcome, records) = request_snapshots(&shared.client, &shared.options.archive_base, &url).await;

        if outcome == SnapshotOutcome::RateLimited {
            warn!(%url, backoff = ?shared.options.rate_limit_backoff, "rate limited, dropping URL for this pass");
            pause(&shared.cancel, shared.options.rate_limit_backoff).await;
        }

        finish_url(&shared, position, url, outcome, &records).await;
        pause(&shared.cancel, shared.options.courtesy_delay).await;
    }
    debug!(worker = id, "worker done");
}

// Writes the report block and the summary entry for one URL
async fn finish_url(
    shared: &Shared,
    position: usize,
    url: String,
    outcome: SnapshotOutcome,
    records: &[SnapshotRecord],
) {
    let block = match &outcome {
        SnapshotOutcome::Resolved { .. } => Some(format_snapshot_block(&url, records)),
        SnapshotOutcome::NoSnapshots { .. } | SnapshotOutcome::Invalid => Some(format_empty_block(&url)),
        _ => None,
    };
    if let (Some(report), Some(block)) = (&shared.report, block) {
        report.append(&block).await;
    }

    println!("   {} -> {}", url, outcome.label());
    shared
        .summary
        .record(position, SnapshotSummaryEntry { url, outcome });
}

async fn pause(cancel: &CancellationToken, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {}
    }
}

/// One snapshot query, classified
async fn request_snapshots(
    client: &Client,
    archive_base: &str,
    url: &str,
) -> (SnapshotOutcome, Vec<SnapshotRecord>) {
    let query = match snapshot_query_url(archive_base, url) {
        Ok(query) => query,
        Err(e) => return (failed(e.to_string()), Vec::new()),
    };

    let response = match client.get(query).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(%url, error = %e, "snapshot request failed");
            return (failed(e.to_string()), Vec::new());
        }
    };

    // only a 200 has a body worth parsing
    match response.status() {
        StatusCode::OK => {}
        StatusCode::TOO_MANY_REQUESTS => return (SnapshotOutcome::RateLimited, Vec::new()),
        status => {
            warn!(%url, status = status.as_u16(), "snapshot request returned non-200");
            return (failed(format!("HTTP {}", status.as_u16())), Vec::new());
        }
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(%url, error = %e, "failed to read snapshot response");
            return (failed(e.to_string()), Vec::new());
        }
    };

    if is_invalid_body(&body) {
        warn!(%url, "invalid snapshot response");
        return (SnapshotOutcome::Invalid, Vec::new());
    }

    // one bad line doesn't spoil the rest of the response
    let mut records = Vec::new();
    let mut skipped = 0;
    for line in parse_body(archive_base, &body) {
        match line {
            LineOutcome::Record(record) => records.push(record),
            LineOutcome::Skipped(reason) => {
                warn!(%url, %reason, "skipping snapshot line");
                skipped += 1;
            }
        }
    }

    let outcome = if records.is_empty() {
        SnapshotOutcome::NoSnapshots { skipped }
    } else {
        SnapshotOutcome::Resolved {
            snapshots: records.len(),
            skipped,
        }
    };
    (outcome, records)
}

fn failed(reason: String) -> SnapshotOutcome {
    SnapshotOutcome::Failed { reason }
}

fn is_invalid_body(body: &str) -> bool {
    body.trim().is_empty() || body.to_ascii_lowercase().contains("<html")
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why share one Receiver behind a Mutex?
//    - tokio's mpsc channel has a single consumer
//    - Wrapping it in Arc<Mutex<_>> lets N workers take turns pulling from it;
//      the lock is dropped before the request is sent, so only the dequeue
//      is serialized
//
// 2. Why a bounded channel of size `workers`?
//    - The producer can only run a few URLs ahead of the workers
//    - When the deadline fires, whatever is still in the channel was never
//      started and gets reported as Cancelled
//
// 3. What does `biased;` do in select!?
//    - Branches are polled top to bottom instead of in random order
//    - Cancellation is listed first, so a cancelled pass never dequeues one
//      more URL just because one happened to be ready
//
// 4. Why a child token?
//    - Cancelling the child (deadline or end of pass) doesn't cancel the
//      caller's token, but cancelling the caller's token (Ctrl-C) does reach
//      the child
// -----------------------------------------------------------------------------
