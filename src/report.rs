// src/report.rs
// =============================================================================
// Console output for the scan and snapshot summaries.
//
// Two formats:
// - a plain aligned table for humans
// - pretty JSON (--json) for scripts
// =============================================================================

use crate::aggregate::{AggregateReport, SaveStatus};
use crate::filter::FilterStats;
use crate::snapshots::{SnapshotOutcome, SnapshotRunReport};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct ScanJson<'a> {
    domain: &'a str,
    filter: FilterStats,
    #[serde(flatten)]
    report: &'a AggregateReport,
}

pub fn print_scan_summary(
    domain: &str,
    stats: FilterStats,
    report: &AggregateReport,
    json: bool,
) -> Result<()> {
    if json {
        let out = ScanJson {
            domain,
            filter: stats,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_scan_table(report);
    }
    Ok(())
}

fn print_scan_table(report: &AggregateReport) {
    println!("\n📊 Results Summary:");
    println!("{:<12} {:<45} {:<10} {:>12}", "FILE FOUND", "FILE NAME", "STATUS", "URL COUNT");
    println!("{}", "=".repeat(82));

    for outcome in &report.outcomes {
        let status = match &outcome.status {
            SaveStatus::Success => "✅ Success",
            SaveStatus::Failed(_) => "❌ Failed",
        };
        println!(
            "{:<12} {:<45} {:<10} {:>12}",
            outcome.extension,
            truncate(&outcome.file_name, 45),
            status,
            format!("{} URLs", outcome.count)
        );
    }

    println!("{}", "-".repeat(82));
    println!("{:<12} {:<45} {:<10} {:>12}", "", "", "TOTAL", format!("{} URLs", report.total_urls));

    if report.unclassified > 0 {
        println!(
            "\n⚠️  {} filtered URL(s) had no trailing extension and were not saved",
            report.unclassified
        );
    }
    for outcome in &report.outcomes {
        if let SaveStatus::Failed(reason) = &outcome.status {
            println!("⚠️  {}: {}", outcome.file_name, reason);
        }
    }
}

pub fn print_snapshot_summary(report: &SnapshotRunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\n📊 Summary of Snapshots:");
    println!("{:<70} {:<20}", "URL", "SNAPSHOT COUNT");
    println!("{}", "=".repeat(90));
    for entry in &report.entries {
        println!("{:<70} {:<20}", truncate(&entry.url, 70), entry.outcome.label());
    }
    println!();

    let resolved = report.count_where(|o| matches!(o, SnapshotOutcome::Resolved { .. }));
    let empty = report.count_where(|o| {
        matches!(o, SnapshotOutcome::NoSnapshots { .. } | SnapshotOutcome::Invalid)
    });
    let limited = report.count_where(|o| matches!(o, SnapshotOutcome::RateLimited));
    let failed = report.count_where(|o| matches!(o, SnapshotOutcome::Failed { .. }));
    let cancelled = report.count_where(|o| matches!(o, SnapshotOutcome::Cancelled));

    println!("   ✅ With snapshots: {} ({} snapshots)", resolved, report.total_snapshots());
    println!("   📭 No snapshots: {}", empty);
    println!("   ⏳ Rate limited: {}", limited);
    println!("   ❌ Failed: {}", failed);
    if cancelled > 0 {
        println!("   ⏹️  Not started (deadline): {}", cancelled);
    }
    if report.skipped_lines() > 0 {
        println!("   ⚠️  Skipped malformed lines: {}", report.skipped_lines());
    }

    match (&report.report_path, &report.report_error) {
        (Some(path), None) => println!("\n📁 All snapshots saved to: {}", path.display()),
        (Some(path), Some(e)) => println!("\n⚠️  Snapshots saved to {} with errors: {}", path.display(), e),
        (None, Some(e)) => println!("\n❌ Snapshot report was not written: {}", e),
        (None, None) => {}
    }
    Ok(())
}

pub fn print_list(title: &str, items: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        println!("{}", title);
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {}", i + 1, item);
        }
    }
    Ok(())
}

// Keeps long URLs from wrecking the table layout
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
