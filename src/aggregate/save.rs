// src/aggregate/save.rs
// =============================================================================
// The concurrent save pass.
//
// One tokio task per extension group writes `<domain>.<ext>.txt` (one URL
// per line). Each group is its own failure domain: a write error is recorded
// as a Failed outcome and the other groups carry on. The pass itself never
// returns an error.
// =============================================================================

use super::accumulator::{SaveAccumulator, SaveOutcome, SaveStatus};
use super::group::ExtensionGroups;
use crate::error::HuntError;
use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info};

/// Everything the summary table needs from the save pass
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    /// One entry per group, in discovery order
    pub outcomes: Vec<SaveOutcome>,
    /// Sum of all group counts
    pub total_urls: usize,
    /// Filtered URLs that had no extractable extension
    pub unclassified: usize,
}

impl AggregateReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

pub fn group_file_name(domain: &str, ext: &str) -> String {
    format!("{}.{}.txt", domain, ext)
}

/// Writes every group to `output_dir`, concurrently, and reports the outcomes
pub async fn save_groups(groups: ExtensionGroups, domain: &str, output_dir: &Path) -> AggregateReport {
    let (groups, unclassified) = groups.into_parts();
    if !unclassified.is_empty() {
        info!(
            count = unclassified.len(),
            "filtered URLs without a trailing extension were left out of the groups"
        );
    }

    let accumulator = Arc::new(SaveAccumulator::new());
    let mut expected = Vec::with_capacity(groups.len());
    let mut handles = Vec::with_capacity(groups.len());

    for (slot, (ext, urls)) in groups.into_iter().enumerate() {
        let file_name = group_file_name(domain, &ext);
        let path = output_dir.join(&file_name);
        // kept so a task that dies can still be reported
        expected.push((slot, ext.clone(), file_name.clone(), path.clone(), urls.len()));

        // each task owns its group and a handle to the shared accumulator
        let accumulator = accumulator.clone();
        handles.push(tokio::spawn(async move {
            let status = match write_group(&path, &urls).await {
                Ok(()) => {
                    info!(file = %file_name, count = urls.len(), "saved group");
                    SaveStatus::Success
                }
                Err(e) => {
                    error!(file = %file_name, error = %e, "failed to save group");
                    SaveStatus::Failed(e.to_string())
                }
            };
            accumulator.record(
                slot,
                SaveOutcome {
                    extension: ext,
                    file_name,
                    path,
                    status,
                    count: urls.len(),
                },
            );
        }));
    }

    // JoinError means the task panicked or was cancelled
    for result in join_all(handles).await {
        if let Err(e) = result {
            error!(error = %e, "save task did not finish");
        }
    }

    // A task that died before recording still shows up, as Failed
    for (slot, extension, file_name, path, count) in expected {
        if !accumulator.is_recorded(slot) {
            accumulator.record(
                slot,
                SaveOutcome {
                    extension,
                    file_name,
                    path,
                    status: SaveStatus::Failed("save task aborted".to_string()),
                    count,
                },
            );
        }
    }

    let (outcomes, total_urls) = accumulator.snapshot();
    info!(total_urls, groups = outcomes.len(), "save pass finished");

    AggregateReport {
        outcomes,
        total_urls,
        unclassified: unclassified.len(),
    }
}

async fn write_group(path: &Path, urls: &[String]) -> Result<(), HuntError> {
    let persist = |e: std::io::Error| HuntError::persistence(path, e);

    let file = tokio::fs::File::create(path).await.map_err(persist)?;
    let mut writer = BufWriter::new(file);
    for url in urls {
        writer.write_all(url.as_bytes()).await.map_err(persist)?;
        writer.write_all(b"\n").await.map_err(persist)?;
    }
    // BufWriter doesn't flush on drop in async code
    writer.flush().await.map_err(persist)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::group_by_extension;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_single_group_written() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_by_extension(vec!["http://a.com/x.pdf", "http://a.com/z.pdf?v=2"]);

        let report = save_groups(groups, "a.com", dir.path()).await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].is_success());
        assert_eq!(report.total_urls, 2);
        assert_eq!(
            read_lines(&dir.path().join("a.com.pdf.txt")),
            vec!["http://a.com/x.pdf", "http://a.com/z.pdf?v=2"]
        );
    }

    #[tokio::test]
    async fn test_totals_across_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut urls: Vec<String> = (0..3).map(|i| format!("http://a.com/{}.sql", i)).collect();
        urls.extend((0..5).map(|i| format!("http://a.com/{}.pdf", i)));

        let report = save_groups(group_by_extension(urls), "a.com", dir.path()).await;

        assert_eq!(report.total_urls, 8);
        assert_eq!(report.failed(), 0);
        assert_eq!(read_lines(&dir.path().join("a.com.sql.txt")).len(), 3);
        assert_eq!(read_lines(&dir.path().join("a.com.pdf.txt")).len(), 5);
        let order: Vec<&str> = report.outcomes.iter().map(|o| o.extension.as_str()).collect();
        assert_eq!(order, vec!["sql", "pdf"]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_group() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the pdf file should go makes that one write fail
        std::fs::create_dir(dir.path().join("a.com.pdf.txt")).unwrap();
        let groups = group_by_extension(vec!["http://a.com/x.pdf", "http://a.com/y.sql"]);

        let report = save_groups(groups, "a.com", dir.path()).await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.outcomes[0].status, SaveStatus::Failed(_)));
        assert!(report.outcomes[1].is_success());
        assert_eq!(report.total_urls, 2);
        assert_eq!(read_lines(&dir.path().join("a.com.sql.txt")), vec!["http://a.com/y.sql"]);
    }

    #[tokio::test]
    async fn test_unclassified_count_reported() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_by_extension(vec!["http://a.com/x.pdf", "http://a.com/plain"]);
        let report = save_groups(groups, "a.com", dir.path()).await;
        assert_eq!(report.unclassified, 1);
        assert_eq!(report.total_urls, 1);
    }
}
