// src/pipeline.rs
// =============================================================================
// Wires the components together.
//
// Scan pass (unconditional):
//   fetch index -> filter lines -> create results dir -> group -> save
//
// Snapshot pass (on request):
//   read saved groups -> resolve snapshots -> report
//
// The results directory is only created once the index has been read in
// full, so a failed fetch leaves nothing behind.
// =============================================================================

use crate::aggregate::{group_by_extension, save_groups, AggregateReport};
use crate::archive::{fetch_index, index_query_url};
use crate::error::Result;
use crate::filter::{filter_stream, FilterSpec, FilterStats};
use crate::results::{ensure_domain_dir, load_group_urls};
use crate::snapshots::{resolve_snapshots, snapshot_report_name, SnapshotOptions, SnapshotRunReport};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything a scan needs besides the HTTP client
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    pub domain: &'a str,
    pub archive_base: &'a str,
    pub output_root: &'a Path,
    pub filter: &'a FilterSpec,
}

#[derive(Debug)]
pub struct ScanResult {
    pub stats: FilterStats,
    pub report: AggregateReport,
    pub output_dir: PathBuf,
}

/// Fetch, filter, group and save. Fails only when the index can't be read
/// or the results directory can't be created.
pub async fn run_scan(client: &Client, request: &ScanRequest<'_>) -> Result<ScanResult> {
    let url = index_query_url(request.archive_base, request.domain)?;

    println!("\n🌐 Fetching data from the archive...");
    let lines = fetch_index(client, &url).await?;
    let (filtered, stats) = filter_stream(lines.into_stream(), request.filter).await?;

    println!("📄 Total URLs found (before filtering): {}", stats.total);
    println!("🔎 URLs matching [{}]: {}", request.filter.tokens().join(", "), stats.matched);
    info!(total = stats.total, matched = stats.matched, "index filtered");

    let output_dir = ensure_domain_dir(request.output_root, request.domain)?;
    println!("📁 Saving results to '{}'", output_dir.display());

    let groups = group_by_extension(filtered);
    if groups.is_empty() {
        println!("⚠️  No URLs matched [{}]", request.filter.tokens().join(", "));
    }
    for (ext, urls) in groups.iter() {
        debug!(ext, count = urls.len(), "extension group");
    }
    info!(
        groups = groups.len(),
        urls = groups.url_count(),
        unclassified = groups.unclassified().len(),
        "grouped by extension"
    );

    let report = save_groups(groups, request.domain, &output_dir).await;

    Ok(ScanResult {
        stats,
        report,
        output_dir,
    })
}

/// Reads the saved groups for `extensions` and resolves their snapshots.
/// Returns None when there is nothing to resolve.
pub async fn run_snapshot_pass(
    client: &Client,
    output_root: &Path,
    domain: &str,
    extensions: &[String],
    options: SnapshotOptions,
    cancel: CancellationToken,
) -> Result<Option<SnapshotRunReport>> {
    let urls = load_group_urls(output_root, domain, extensions);
    if urls.is_empty() {
        println!("⚠️  No saved URLs found for [{}]", extensions.join(", "));
        return Ok(None);
    }

    let output_dir = ensure_domain_dir(output_root, domain)?;
    let report_path = output_dir.join(snapshot_report_name(domain));

    println!(
        "\n🕰️  Fetching snapshots for {} URL(s) with {} worker(s)...\n",
        urls.len(),
        options.workers
    );
    let report = resolve_snapshots(client, urls, report_path, options, cancel).await;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HuntError;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn index_server(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdx/search/cdx"))
            .and(query_param("url", "*.a.com/*"))
            .and(query_param("fl", "original"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_scan_groups_pdf_lines() {
        let server = index_server(
            200,
            "http://a.com/x.pdf\n\nhttp://a.com/y.exe\nhttp://a.com/z.pdf?v=2\n",
        )
        .await;
        let root = tempfile::tempdir().unwrap();
        let filter = FilterSpec::new(["pdf"]).unwrap();
        let base = server.uri();
        let request = ScanRequest {
            domain: "a.com",
            archive_base: &base,
            output_root: root.path(),
            filter: &filter,
        };

        let result = run_scan(&Client::new(), &request).await.unwrap();

        assert_eq!(result.stats, FilterStats { total: 3, matched: 2 });
        assert_eq!(result.report.outcomes.len(), 1);
        assert_eq!(result.report.outcomes[0].extension, "pdf");
        assert_eq!(result.report.total_urls, 2);
        let saved = std::fs::read_to_string(root.path().join("a.com/a.com.pdf.txt")).unwrap();
        assert_eq!(saved.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_creates_nothing() {
        let server = index_server(500, "boom").await;
        let root = tempfile::tempdir().unwrap();
        let filter = FilterSpec::new(["pdf"]).unwrap();
        let base = server.uri();
        let request = ScanRequest {
            domain: "a.com",
            archive_base: &base,
            output_root: root.path(),
            filter: &filter,
        };

        let err = run_scan(&Client::new(), &request).await.unwrap_err();

        assert!(matches!(err, HuntError::FetchStatus { status: 500, .. }));
        assert!(!root.path().join("a.com").exists());
    }

    #[tokio::test]
    async fn test_two_groups_total_row() {
        let mut body = String::new();
        for i in 0..3 {
            body.push_str(&format!("http://a.com/{}.sql\n", i));
        }
        for i in 0..5 {
            body.push_str(&format!("http://a.com/{}.pdf\n", i));
        }
        let server = index_server(200, &body).await;
        let root = tempfile::tempdir().unwrap();
        let filter = FilterSpec::new(["pdf", "sql"]).unwrap();
        let base = server.uri();
        let request = ScanRequest {
            domain: "a.com",
            archive_base: &base,
            output_root: root.path(),
            filter: &filter,
        };

        let result = run_scan(&Client::new(), &request).await.unwrap();

        assert_eq!(result.report.total_urls, 8);
        let count = |ext: &str| {
            std::fs::read_to_string(root.path().join(format!("a.com/a.com.{}.txt", ext)))
                .unwrap()
                .lines()
                .count()
        };
        assert_eq!(count("sql"), 3);
        assert_eq!(count("pdf"), 5);
    }

    #[tokio::test]
    async fn test_snapshot_pass_reads_saved_groups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdx/search/cdx"))
            .and(query_param("fl", "timestamp,original"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("20200101000000 http://a.com/x.pdf\n"),
            )
            .mount(&server)
            .await;
        let root = tempfile::tempdir().unwrap();
        let dir = ensure_domain_dir(root.path(), "a.com").unwrap();
        std::fs::write(dir.join("a.com.pdf.txt"), "http://a.com/x.pdf\n").unwrap();

        let options = SnapshotOptions {
            archive_base: server.uri(),
            workers: 2,
            courtesy_delay: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            deadline: Some(Duration::from_secs(30)),
        };
        let report = run_snapshot_pass(
            &Client::new(),
            root.path(),
            "a.com",
            &["pdf".to_string()],
            options,
            CancellationToken::new(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(report.total_snapshots(), 1);
        assert!(dir.join("a.com.snapshots.txt").exists());
    }

    #[tokio::test]
    async fn test_snapshot_pass_without_saved_urls() {
        let root = tempfile::tempdir().unwrap();
        let result = run_snapshot_pass(
            &Client::new(),
            root.path(),
            "a.com",
            &["pdf".to_string()],
            SnapshotOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
