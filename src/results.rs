// src/results.rs
// =============================================================================
// Layout of the results directory and reading saved groups back.
//
//   results/
//     target.com/
//       target.com.pdf.txt
//       target.com.sql.txt
//       target.com.snapshots.txt
//
// The snapshot pass starts from these files, so a scan and a snapshot run
// do not have to happen in the same process.
// =============================================================================

use crate::aggregate::group_file_name;
use crate::error::{HuntError, Result};
use crate::snapshots::snapshot_report_name;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn domain_dir(root: &Path, domain: &str) -> PathBuf {
    root.join(domain)
}

/// Creates `root/<domain>` (and `root`) if missing
pub fn ensure_domain_dir(root: &Path, domain: &str) -> Result<PathBuf> {
    let dir = domain_dir(root, domain);
    fs::create_dir_all(&dir).map_err(|e| HuntError::persistence(&dir, e))?;
    Ok(dir)
}

/// Domains that have a results directory, sorted
pub fn list_domains(root: &Path) -> Result<Vec<String>> {
    let mut domains: Vec<String> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();

    if domains.is_empty() {
        return Err(HuntError::config(format!(
            "no domains found in {}",
            root.display()
        )));
    }
    domains.sort();
    Ok(domains)
}

/// Extensions saved for `domain`, taken from `<domain>.<ext>.txt` names
pub fn list_extensions(root: &Path, domain: &str) -> Result<Vec<String>> {
    let report = snapshot_report_name(domain);
    let prefix = format!("{}.", domain);

    let mut extensions: Vec<String> = fs::read_dir(domain_dir(root, domain))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| *name != report)
        .filter_map(|name| {
            let ext = name.strip_prefix(&prefix)?.strip_suffix(".txt")?;
            if ext.is_empty() || ext.contains('.') {
                None
            } else {
                Some(ext.to_string())
            }
        })
        .collect();

    if extensions.is_empty() {
        return Err(HuntError::config(format!(
            "no saved extensions found for {}",
            domain
        )));
    }
    extensions.sort();
    Ok(extensions)
}

/// Reads the saved URLs for the given extensions. A file that cannot be
/// read is logged and skipped.
pub fn load_group_urls(root: &Path, domain: &str, extensions: &[String]) -> Vec<String> {
    let dir = domain_dir(root, domain);
    let mut urls = Vec::new();

    for ext in extensions {
        let path = dir.join(group_file_name(domain, ext));
        match fs::read_to_string(&path) {
            Ok(content) => urls.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            ),
            Err(e) => {
                eprintln!("⚠️  Failed to read {}: {}", path.display(), e);
                warn!(path = %path.display(), error = %e, "failed to read saved group");
            }
        }
    }

    urls
}
