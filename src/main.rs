// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and load the config
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = some results could not be
//    saved, 2 = error)
// =============================================================================

mod aggregate;
mod archive;
mod cli;
mod config;
mod error;
mod filter;
mod logging;
mod network;
mod pipeline;
mod report;
mod results;
mod snapshots;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Pacing, Settings};
use config::{clamp_workers, max_workers, Config, RawConfig};
use network::{probe_all, HttpClients, ProbeTargets, DEFAULT_REQUEST_TIMEOUT};
use pipeline::{run_scan, run_snapshot_pass, ScanRequest};
use snapshots::{SnapshotOptions, SnapshotRunReport};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Commands::Scan {
            domain,
            extensions,
            settings,
            skip_probe,
            snapshots,
            pacing,
        } => {
            let config = load_scan_config(settings, extensions)?;
            handle_scan(&cli, domain, &config, *skip_probe, snapshots, pacing).await
        }
        Commands::Snapshots {
            domain,
            selected,
            all,
            settings,
            pacing,
        } => {
            let workers = load_workers(settings);
            let extensions = if *all {
                results::list_extensions(&cli.output_dir, domain)?
            } else {
                selected.clone()
            };
            handle_snapshots(&cli, domain, &extensions, workers, pacing).await
        }
        Commands::List { domain } => handle_list(&cli, domain.as_deref()),
    }
}

// Config file first, CLI flags on top. The file may be missing as long as
// --extensions was given.
fn load_scan_config(settings: &Settings, extensions: &[String]) -> Result<Config> {
    let mut raw = match RawConfig::load(&settings.config) {
        Ok(raw) => raw,
        Err(e) if !extensions.is_empty() => {
            warn!(error = %e, "config file unavailable, using command-line extensions");
            RawConfig::default()
        }
        Err(e) => return Err(e).context("no extensions given: pass --extensions or a config file"),
    };

    if !extensions.is_empty() {
        raw.extensions = extensions.to_vec();
    }
    if settings.workers.is_some() {
        raw.num_workers = settings.workers;
    }
    Ok(raw.validate()?)
}

// Only the worker count matters for a snapshot-only run
fn load_workers(settings: &Settings) -> usize {
    let from_file = RawConfig::load(&settings.config)
        .ok()
        .and_then(|raw| raw.num_workers);
    clamp_workers(settings.workers.or(from_file), max_workers())
}

fn snapshot_options(cli: &Cli, workers: usize, pacing: &Pacing) -> SnapshotOptions {
    SnapshotOptions {
        archive_base: cli.archive_base.clone(),
        workers,
        courtesy_delay: Duration::from_millis(pacing.courtesy_delay_ms),
        rate_limit_backoff: Duration::from_millis(pacing.rate_limit_backoff_ms),
        deadline: pacing.deadline_secs.map(Duration::from_secs),
    }
}

async fn handle_scan(
    cli: &Cli,
    domain: &str,
    config: &Config,
    skip_probe: bool,
    snapshot_exts: &[String],
    pacing: &Pacing,
) -> Result<i32> {
    let start = Instant::now();
    println!("🔍 Hunting archived files for: {}", domain);

    let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT)?;

    if !skip_probe {
        probe_all(&clients, &ProbeTargets::new(&cli.archive_base), domain).await?;
    }

    let request = ScanRequest {
        domain,
        archive_base: &cli.archive_base,
        output_root: &cli.output_dir,
        filter: &config.filter,
    };
    let scan = run_scan(&clients.archive, &request).await?;
    report::print_scan_summary(domain, scan.stats, &scan.report, cli.json)?;

    println!(
        "\n✅ Scan completed in {:.2} seconds. Results saved in '{}'",
        start.elapsed().as_secs_f64(),
        scan.output_dir.display()
    );

    let snapshots = if snapshot_exts.is_empty() {
        None
    } else {
        run_snapshots(cli, &clients, domain, snapshot_exts, config.num_workers, pacing).await?
    };

    Ok(exit_code(scan.report.failed(), snapshots.as_ref()))
}

async fn handle_snapshots(
    cli: &Cli,
    domain: &str,
    extensions: &[String],
    workers: usize,
    pacing: &Pacing,
) -> Result<i32> {
    let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT)?;
    let report = run_snapshots(cli, &clients, domain, extensions, workers, pacing).await?;
    Ok(exit_code(0, report.as_ref()))
}

// 1 when any output file is missing or incomplete, 0 otherwise
fn exit_code(failed_groups: usize, snapshots: Option<&SnapshotRunReport>) -> i32 {
    let report_incomplete = snapshots
        .map(|report| report.report_error.is_some())
        .unwrap_or(false);
    if failed_groups > 0 || report_incomplete {
        1
    } else {
        0
    }
}

async fn run_snapshots(
    cli: &Cli,
    clients: &HttpClients,
    domain: &str,
    extensions: &[String],
    workers: usize,
    pacing: &Pacing,
) -> Result<Option<SnapshotRunReport>> {
    let start = Instant::now();

    // Ctrl-C stops new lookups; whatever finished is still reported
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⏹️  Interrupted, finishing in-flight lookups...");
            on_interrupt.cancel();
        }
    });

    let report = run_snapshot_pass(
        &clients.archive,
        &cli.output_dir,
        domain,
        extensions,
        snapshot_options(cli, workers, pacing),
        cancel,
    )
    .await?;

    if let Some(report) = &report {
        report::print_snapshot_summary(report, cli.json)?;
        println!(
            "\n⏱️  Total duration for snapshot scan: {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
    }
    Ok(report)
}

fn handle_list(cli: &Cli, domain: Option<&str>) -> Result<i32> {
    match domain {
        Some(domain) => {
            let extensions = results::list_extensions(&cli.output_dir, domain)
                .with_context(|| format!("listing saved extensions for {}", domain))?;
            report::print_list(&format!("Available extensions for {}:", domain), &extensions, cli.json)?;
        }
        None => {
            let domains = results::list_domains(&cli.output_dir)
                .with_context(|| format!("listing {}", cli.output_dir.display()))?;
            report::print_list("Available domains:", &domains, cli.json)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_run(report_error: Option<&str>) -> SnapshotRunReport {
        SnapshotRunReport {
            entries: Vec::new(),
            report_path: None,
            report_error: report_error.map(str::to_string),
        }
    }

    #[test]
    fn test_exit_code_clean_run() {
        assert_eq!(exit_code(0, None), 0);
        assert_eq!(exit_code(0, Some(&snapshot_run(None))), 0);
    }

    #[test]
    fn test_exit_code_failed_group() {
        assert_eq!(exit_code(2, None), 1);
        assert_eq!(exit_code(1, Some(&snapshot_run(None))), 1);
    }

    #[test]
    fn test_exit_code_unwritable_snapshot_report() {
        // scan saved everything but the report could not be created
        let run = snapshot_run(Some("failed to write results/a.com/a.com.snapshots.txt"));
        assert_eq!(exit_code(0, Some(&run)), 1);
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why does main() call std::process::exit instead of returning Result?
//    - Returning Err from main always exits with code 1
//    - We need three codes (0, 1, 2), so run() hands back the number and
//      main() exits with it
//
// 2. Why spawn a task for Ctrl-C?
//    - tokio::signal::ctrl_c() is a future that resolves on the first SIGINT
//    - The task only flips the CancellationToken; workers see it and stop
//      picking up URLs, so the summary still gets printed
// -----------------------------------------------------------------------------
