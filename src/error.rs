// src/error.rs
// =============================================================================
// Error types shared by the probe, fetch, config and persistence layers.
//
// Only things that can stop a run (or a single file write) live here.
// Rate limiting and unparseable snapshot lines are *outcomes*, not errors -
// see snapshots::record and snapshots::resolve for those.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by every module below main.rs
pub type Result<T> = std::result::Result<T, HuntError>;

/// Which reachability check failed before any work started
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("no internet or slow connection")]
    NoInternet,
    #[error("the archive service is currently down")]
    ArchiveDown,
    #[error("domain '{0}' is not reachable")]
    DomainUnreachable(String),
}

#[derive(Debug, Error)]
pub enum HuntError {
    /// Fatal: checked before the fetch pass
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    /// Fatal: the index query could not be sent or its body could not be read
    #[error("error fetching URLs from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Fatal: the index query answered with a non-2xx status
    #[error("error fetching URLs from {url}: HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    /// Isolated: one group file or the snapshot report could not be written
    #[error("failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HuntError {
    pub fn config(message: impl Into<String>) -> Self {
        HuntError::Config {
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HuntError::Persistence {
            path: path.into(),
            source,
        }
    }
}
