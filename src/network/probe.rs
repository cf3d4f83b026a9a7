// src/network/probe.rs
// =============================================================================
// Availability checks that run before the fetch pass.
//
// Order matters: there is no point asking whether the archive is up when
// there is no internet at all, and no point fetching the index for a domain
// that does not answer. Each failed check is fatal to the run.
// =============================================================================

use super::client::HttpClients;
use crate::error::{ConnectivityError, Result};
use reqwest::Client;
use tracing::{debug, warn};

/// Endpoints used by the probes
#[derive(Debug, Clone)]
pub struct ProbeTargets {
    /// Any well-known site; any response at all counts as "online"
    pub internet_url: String,
    /// The archive front page; must answer 200
    pub archive_url: String,
}

impl ProbeTargets {
    pub fn new(archive_base: &str) -> Self {
        ProbeTargets {
            internet_url: "https://www.google.com".to_string(),
            archive_url: archive_base.to_string(),
        }
    }
}

/// Runs internet -> archive -> domain checks, stopping at the first failure
pub async fn probe_all(clients: &HttpClients, targets: &ProbeTargets, domain: &str) -> Result<()> {
    if !check_internet(&clients.probe, &targets.internet_url).await {
        return Err(ConnectivityError::NoInternet.into());
    }
    println!("✅ Connected to the Internet!");

    if !check_archive(&clients.probe, &targets.archive_url).await {
        return Err(ConnectivityError::ArchiveDown.into());
    }
    println!("✅ Archive is UP and running.");

    if !check_domain(&clients.domain_probe, domain).await {
        return Err(ConnectivityError::DomainUnreachable(domain.to_string()).into());
    }
    println!("✅ Domain is active!");

    Ok(())
}

async fn check_internet(client: &Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "no internet connection");
            false
        }
    }
}

async fn check_archive(client: &Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => true,
        Ok(response) => {
            warn!(status = response.status().as_u16(), "archive answered with non-200");
            false
        }
        Err(e) => {
            warn!(error = %e, "archive is down");
            false
        }
    }
}

// Tries https first, then plain http. Any 2xx/3xx counts as alive.
async fn check_domain(client: &Client, domain: &str) -> bool {
    for scheme in ["https", "http"] {
        let url = format!("{}://{}", scheme, domain);
        match client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    return true;
                }
                warn!(%url, status = status.as_u16(), "domain returned error status");
                return false;
            }
            Err(e) => debug!(%url, error = %e, "domain probe failed"),
        }
    }
    warn!(domain, "domain is not reachable");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HuntError;
    use crate::network::DEFAULT_REQUEST_TIMEOUT;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_status(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_archive_must_answer_200() {
        let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let up = server_with_status(200).await;
        let down = server_with_status(503).await;

        assert!(check_archive(&clients.probe, &up.uri()).await);
        assert!(!check_archive(&clients.probe, &down.uri()).await);
    }

    #[tokio::test]
    async fn test_domain_falls_back_to_http() {
        let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let server = server_with_status(200).await;
        let host = server.address().to_string();

        assert!(check_domain(&clients.domain_probe, &host).await);
    }

    #[tokio::test]
    async fn test_probe_all_reports_archive_down() {
        let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let internet = server_with_status(204).await;
        let archive = server_with_status(500).await;
        let targets = ProbeTargets {
            internet_url: internet.uri(),
            archive_url: archive.uri(),
        };

        let err = probe_all(&clients, &targets, "example.invalid").await.unwrap_err();
        assert!(matches!(
            err,
            HuntError::Connectivity(ConnectivityError::ArchiveDown)
        ));
    }

    #[tokio::test]
    async fn test_probe_all_reports_unreachable_domain() {
        let clients = HttpClients::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let up = server_with_status(200).await;
        let targets = ProbeTargets {
            internet_url: up.uri(),
            archive_url: up.uri(),
        };

        let err = probe_all(&clients, &targets, "127.0.0.1:1").await.unwrap_err();
        assert!(matches!(
            err,
            HuntError::Connectivity(ConnectivityError::DomainUnreachable(_))
        ));
    }
}
