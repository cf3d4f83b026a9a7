// src/archive/mod.rs
// =============================================================================
// Talks to the archive's CDX index API.
//
// Submodules:
// - query: builds the index and snapshot query URLs
// - fetch: issues the index query and reads the body line by line
// =============================================================================

mod fetch;
mod query;

pub use fetch::fetch_index;
pub use query::{index_query_url, snapshot_query_url, DEFAULT_ARCHIVE_BASE};
