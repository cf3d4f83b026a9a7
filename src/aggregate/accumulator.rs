// src/aggregate/accumulator.rs
// =============================================================================
// The summary shared by every save task.
//
// Save tasks finish in any order, so each one records its outcome under a
// slot number (the group's discovery position). `snapshot()` hands back the
// outcomes in slot order, which keeps the summary in discovery order no
// matter which task won the race.
//
// The lock is only held for the in-memory update, never across file I/O.
// =============================================================================

use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum SaveStatus {
    Success,
    Failed(String),
}

/// What happened to one extension group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub extension: String,
    pub file_name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: SaveStatus,
    pub count: usize,
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SaveStatus::Success)
    }
}

#[derive(Debug, Default)]
struct State {
    // indexed by slot; grows on demand
    outcomes: Vec<Option<SaveOutcome>>,
    total_urls: usize,
}

/// Thread-safe collector for save outcomes and the running URL total
#[derive(Debug, Default)]
pub struct SaveAccumulator {
    state: Mutex<State>,
}

impl SaveAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking save task must not take the summary down with it
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the outcome for `slot`. Returns false (and keeps the first
    /// outcome) if the slot was already recorded.
    pub fn record(&self, slot: usize, outcome: SaveOutcome) -> bool {
        let mut state = self.lock();
        if state.outcomes.len() <= slot {
            state.outcomes.resize(slot + 1, None);
        }
        if state.outcomes[slot].is_some() {
            warn!(slot, ext = %outcome.extension, "save outcome recorded twice, keeping the first");
            return false;
        }
        state.total_urls += outcome.count;
        state.outcomes[slot] = Some(outcome);
        true
    }

    pub fn is_recorded(&self, slot: usize) -> bool {
        matches!(self.lock().outcomes.get(slot), Some(Some(_)))
    }

    /// Outcomes in slot order, plus the total URL count
    pub fn snapshot(&self) -> (Vec<SaveOutcome>, usize) {
        let state = self.lock();
        (
            state.outcomes.iter().flatten().cloned().collect(),
            state.total_urls,
        )
    }
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why std::sync::Mutex and not tokio::sync::Mutex?
//    - The lock is never held across an .await, only for a Vec update
//    - A std Mutex is cheaper for that and works from plain threads too
//
// 2. What is lock poisoning?
//    - If a thread panics while holding a std Mutex, the Mutex is marked
//      poisoned and lock() returns Err
//    - into_inner() on the error still hands us the guard; the data is a list
//      of finished outcomes, so it's safe to keep using
// -----------------------------------------------------------------------------
