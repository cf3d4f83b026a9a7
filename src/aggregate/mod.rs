// src/aggregate/mod.rs
// =============================================================================
// Groups filtered URLs by their real trailing extension and writes one file
// per group.
//
// Submodules:
// - group: extension extraction + grouping (pure)
// - accumulator: thread-safe summary shared by the save tasks
// - save: the concurrent save pass
// =============================================================================

mod accumulator;
mod group;
mod save;

pub use accumulator::SaveStatus;
pub use group::group_by_extension;
pub use save::{group_file_name, save_groups, AggregateReport};
