// src/logging.rs
// =============================================================================
// Structured logging setup.
//
// Diagnostics go to `archive-hunter.log` in the working directory (append
// mode) so they don't clutter the progress output. If the file can't be
// opened we fall back to stderr. `RUST_LOG` overrides the default filter.
//
// Nothing here creates directories: a run that fails early must leave the
// results tree untouched.
// =============================================================================

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "archive-hunter.log";

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "debug"
    } else {
        "info,archive_hunter=debug"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logs to the log file, or to stderr when `verbose` is set or the file
/// cannot be opened.
pub fn init(verbose: bool) {
    if verbose {
        init_stderr(true);
        return;
    }

    let path = Path::new(LOG_FILE);
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let installed = tracing_subscriber::fmt()
                .with_env_filter(env_filter(false))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .is_ok();
            if installed {
                tracing::info!("logging initialized at {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("⚠️  Could not open log file {}: {}", path.display(), e);
            init_stderr(false);
        }
    }
}

fn init_stderr(verbose: bool) {
    // a subscriber may already be installed (tests); that's fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
