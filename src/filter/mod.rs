// src/filter/mod.rs
// =============================================================================
// This module decides which archived URLs we care about.
//
// Submodules:
// - extension: the FilterSpec (configured extensions) and the line filter
//
// The filter is a pure function: it never touches the network or disk, so
// it is safe to call from anywhere.
// =============================================================================

mod extension;

pub use extension::{filter_stream, FilterSpec, FilterStats};
