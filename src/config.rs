// src/config.rs
// =============================================================================
// Loads and validates the JSON configuration file.
//
// Example config.json:
//   {
//     "extensions": ["pdf", "sql", "tar\\.gz"],
//     "numWorkers": 5
//   }
//
// The extension list becomes the FilterSpec; numWorkers sizes the snapshot
// worker pool.
// =============================================================================

use crate::error::{HuntError, Result};
use crate::filter::FilterSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Worker count used when the config leaves it out (or sets it to <= 0)
pub const DEFAULT_NUM_WORKERS: usize = 5;

/// Raw shape of config.json, exactly as written by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default, rename = "numWorkers")]
    pub num_workers: Option<i64>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub filter: FilterSpec,
    pub num_workers: usize,
}

impl RawConfig {
    /// Reads config.json from disk. A missing file is reported as a config
    /// error so the caller can decide whether CLI flags are enough.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            HuntError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| HuntError::config(format!("failed to parse config file: {}", e)))
    }

    /// Validates extensions and clamps the worker count
    pub fn validate(self) -> Result<Config> {
        let filter = FilterSpec::new(self.extensions)?;
        let num_workers = clamp_workers(self.num_workers, max_workers());
        Ok(Config {
            filter,
            num_workers,
        })
    }
}

/// Upper bound for the worker pool: twice the available parallelism
pub fn max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        * 2
}

/// Missing or non-positive -> default; above `max` -> `max`
pub fn clamp_workers(requested: Option<i64>, max: usize) -> usize {
    let max = max.max(1);
    match requested {
        Some(n) if n > 0 => (n as usize).min(max),
        _ => DEFAULT_NUM_WORKERS.min(max),
    }
}
