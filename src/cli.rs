// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - scan: probe, fetch the archive index, filter, save one file per extension
// - snapshots: resolve captures for URLs saved by an earlier scan
// - list: show which domains / extensions have saved results
//
// Options shared by every subcommand live on the top-level struct and are
// marked `global = true` so they can be given before or after the
// subcommand name.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "archive-hunter",
    version,
    about = "Find archived files of a domain in the Wayback Machine index",
    long_about = "archive-hunter lists every URL the archive knows for a domain, keeps the ones \
                  with interesting file extensions, saves them grouped by extension and can \
                  look up every archived snapshot of them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding one results folder per domain
    #[arg(long, global = true, default_value = "results")]
    pub output_dir: PathBuf,

    /// Base URL of the archive service
    #[arg(long, global = true, default_value = crate::archive::DEFAULT_ARCHIVE_BASE)]
    pub archive_base: String,

    /// Output summaries as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Log to stderr at debug level instead of the log file
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the archive index for a domain and save matching URLs
    ///
    /// Example: archive-hunter scan target.com --extensions pdf,sql
    Scan {
        /// Domain to search (e.g., target.com)
        domain: String,

        /// Extensions to keep (comma-separated); overrides the config file
        #[arg(long, value_delimiter = ',')]
        extensions: Vec<String>,

        #[command(flatten)]
        settings: Settings,

        /// Skip the internet / archive / domain reachability checks
        #[arg(long)]
        skip_probe: bool,

        /// Resolve snapshots for these saved extensions right after the scan
        #[arg(long, value_delimiter = ',')]
        snapshots: Vec<String>,

        #[command(flatten)]
        pacing: Pacing,
    },

    /// Look up archived snapshots for URLs saved by a previous scan
    ///
    /// Example: archive-hunter snapshots target.com --ext pdf
    Snapshots {
        /// Domain whose saved results should be used
        domain: String,

        /// Saved extensions to resolve (comma-separated)
        #[arg(long = "ext", value_delimiter = ',', required_unless_present = "all")]
        selected: Vec<String>,

        /// Resolve every saved extension
        #[arg(long, conflicts_with = "selected")]
        all: bool,

        #[command(flatten)]
        settings: Settings,

        #[command(flatten)]
        pacing: Pacing,
    },

    /// List domains with saved results, or the saved extensions of one domain
    List {
        domain: Option<String>,
    },
}

/// Config file location and worker override
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Number of snapshot workers; overrides the config file
    #[arg(long)]
    pub workers: Option<i64>,
}

/// Pacing of the snapshot pass
#[derive(Args, Debug, Clone)]
pub struct Pacing {
    /// Pause between requests of the same worker, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub courtesy_delay_ms: u64,

    /// Pause after an HTTP 429 before moving on, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub rate_limit_backoff_ms: u64,

    /// Stop starting new snapshot lookups after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_with_overrides() {
        let cli = Cli::parse_from([
            "archive-hunter",
            "scan",
            "target.com",
            "--extensions",
            "pdf,sql",
            "--workers",
            "3",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Scan {
                domain,
                extensions,
                settings,
                ..
            } => {
                assert_eq!(domain, "target.com");
                assert_eq!(extensions, vec!["pdf", "sql"]);
                assert_eq!(settings.workers, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_snapshots_requires_ext_or_all() {
        assert!(Cli::try_parse_from(["archive-hunter", "snapshots", "a.com"]).is_err());
        assert!(Cli::try_parse_from(["archive-hunter", "snapshots", "a.com", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["archive-hunter", "snapshots", "a.com", "--ext", "pdf"]).is_ok());
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why `#[command(flatten)]`?
//    - Settings and Pacing are shared by `scan` and `snapshots`
//    - flatten pulls their fields in as if they were declared inline
//
// 2. Why `value_delimiter = ','`?
//    - Lets users write `--extensions pdf,sql` instead of repeating the flag
// -----------------------------------------------------------------------------
