// src/network/mod.rs
// =============================================================================
// Everything that talks to "the network" in general rather than to the
// archive index specifically.
//
// Submodules:
// - client: builds the shared HTTP clients (connection pooling)
// - probe: reachability checks run before any heavy work
// =============================================================================

mod client;
mod probe;

pub use client::{HttpClients, DEFAULT_REQUEST_TIMEOUT};
pub use probe::{probe_all, ProbeTargets};
