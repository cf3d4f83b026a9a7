// src/network/client.rs
// =============================================================================
// Builds the HTTP clients once per run.
//
// reqwest::Client keeps a connection pool internally and is cheap to clone
// (it is an Arc under the hood), so every component gets a clone of the
// same client instead of building its own.
// =============================================================================

use crate::error::{HuntError, Result};
use reqwest::Client;
use std::time::Duration;

/// Per-request timeout for archive index and snapshot queries
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const DOMAIN_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The clients shared by every component of a run
#[derive(Debug, Clone)]
pub struct HttpClients {
    /// Archive index + snapshot queries
    pub archive: Client,
    /// Internet / archive availability probes
    pub probe: Client,
    /// Target domain probe. Accepts invalid certificates: we only want to
    /// know whether something answers.
    pub domain_probe: Client,
}

impl HttpClients {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let archive = Client::builder()
            .timeout(request_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(build_error)?;

        let probe = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(build_error)?;

        let domain_probe = Client::builder()
            .timeout(DOMAIN_PROBE_TIMEOUT)
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(build_error)?;

        Ok(HttpClients {
            archive,
            probe,
            domain_probe,
        })
    }
}

fn build_error(e: reqwest::Error) -> HuntError {
    HuntError::config(format!("failed to create HTTP client: {}", e))
}
