// src/archive/query.rs
// =============================================================================
// Query URL builders for the CDX index.
//
// Index pass:    /cdx/search/cdx?url=*.<domain>/*&collapse=urlkey&output=text&fl=original
// Snapshot pass: /cdx/search/cdx?url=<url>&output=text&fl=timestamp,original
//
// The url crate takes care of percent-encoding, so URLs with their own query
// strings survive being passed as a parameter.
// =============================================================================

use crate::error::{HuntError, Result};
use url::Url;

pub const DEFAULT_ARCHIVE_BASE: &str = "https://web.archive.org";

const CDX_PATH: &str = "/cdx/search/cdx";

pub fn index_query_url(archive_base: &str, domain: &str) -> Result<Url> {
    let pattern = format!("*.{}/*", domain);
    cdx_url(
        archive_base,
        &[
            ("url", pattern.as_str()),
            ("collapse", "urlkey"),
            ("output", "text"),
            ("fl", "original"),
        ],
    )
}

pub fn snapshot_query_url(archive_base: &str, target: &str) -> Result<Url> {
    cdx_url(
        archive_base,
        &[
            ("url", target),
            ("output", "text"),
            ("fl", "timestamp,original"),
        ],
    )
}

fn cdx_url(archive_base: &str, params: &[(&str, &str)]) -> Result<Url> {
    let endpoint = format!("{}{}", archive_base.trim_end_matches('/'), CDX_PATH);
    Url::parse_with_params(&endpoint, params)
        .map_err(|e| HuntError::config(format!("invalid archive base '{}': {}", archive_base, e)))
}
