//! Transient per-pipeline ingestion state and its observable snapshot.
//!
//! One [`IngestionState`] belongs to one pipeline. It is only mutated under
//! the pipeline's lock, and every mutation that matters to a presentation
//! layer is published as a [`ProgressSnapshot`] on a `watch` channel.
//!
//! # Lifecycle
//!
//! ```text
//!  Idle ──select──► Selecting ──ingest──► Encoding ──► Succeeded | Failed
//!   ▲                  │  remove/clear                      │
//!   └──────────────────┴──────────── reset / select ────────┘
//! ```
//!
//! Each `ingest` call and each `reset` bumps the generation. Progress updates
//! carry the generation they were issued for, so a task left over from an
//! abandoned invocation can never write into a newer one.
use std::sync::{Arc, Mutex, MutexGuard};

use ingest::FileDescriptor;
use serde::Serialize;
use tokio::sync::watch;

/// Where a pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Selecting,
    Encoding,
    Succeeded,
    Failed,
}

impl Phase {
    /// Succeeded or Failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// Point-in-time view of a pipeline, as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub phase: Phase,
    /// Derived overall progress, 0..=100.
    pub overall: u8,
    /// Progress per selected file, indexed like the selection.
    pub per_file: Vec<u8>,
    pub generation: u64,
}

/// Mutable state behind a pipeline's lock.
#[derive(Debug, Default)]
pub struct IngestionState {
    phase: Phase,
    selected: Vec<FileDescriptor>,
    per_file: Vec<u8>,
    overall: u8,
    generation: u64,
    last_error: Option<String>,
}

impl IngestionState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Accepted files awaiting (or undergoing) encoding.
    pub fn selected(&self) -> &[FileDescriptor] {
        &self.selected
    }

    pub fn per_file_progress(&self) -> &[u8] {
        &self.per_file
    }

    pub fn overall_progress(&self) -> u8 {
        self.overall
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Aggregate rejection message of the last selection, or the failure
    /// reason of the last batch.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            phase: self.phase,
            overall: self.overall,
            per_file: self.per_file.clone(),
            generation: self.generation,
        }
    }

    pub(crate) fn replace_selection(
        &mut self,
        accepted: Vec<FileDescriptor>,
        error: Option<String>,
    ) {
        self.phase = if accepted.is_empty() {
            Phase::Idle
        } else {
            Phase::Selecting
        };
        self.per_file = vec![0; accepted.len()];
        self.overall = 0;
        self.selected = accepted;
        self.last_error = error;
    }

    pub(crate) fn remove(&mut self, index: usize) -> FileDescriptor {
        let removed = self.selected.remove(index);
        self.per_file.remove(index);
        if self.selected.is_empty() {
            self.phase = Phase::Idle;
        }
        removed
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected.clear();
        self.per_file.clear();
        self.overall = 0;
        self.phase = Phase::Idle;
    }

    /// Moves into `Encoding` and returns the new generation with a copy of
    /// the selection, or `None` when there is nothing to encode.
    pub(crate) fn begin_encoding(&mut self) -> Option<(u64, Vec<FileDescriptor>)> {
        if self.selected.is_empty() {
            return None;
        }
        self.generation += 1;
        self.phase = Phase::Encoding;
        self.per_file = vec![0; self.selected.len()];
        self.overall = 0;
        Some((self.generation, self.selected.clone()))
    }

    /// Applies one per-file update. Returns false when the update was ignored
    /// (stale generation, not encoding, unknown index, or not an increase).
    pub(crate) fn record_progress(&mut self, generation: u64, index: usize, value: u8) -> bool {
        if generation != self.generation || self.phase != Phase::Encoding {
            return false;
        }
        let value = value.min(100);
        match self.per_file.get_mut(index) {
            Some(current) if value > *current => *current = value,
            _ => return false,
        }
        self.overall = overall_progress(&self.per_file);
        true
    }

    /// Ends the invocation `generation`. Selection and progress are cleared;
    /// the terminal phase stays visible until the next select or reset.
    pub(crate) fn finish(&mut self, generation: u64, phase: Phase, error: Option<String>) -> bool {
        if generation != self.generation || self.phase != Phase::Encoding {
            return false;
        }
        self.phase = phase;
        self.selected.clear();
        self.per_file.clear();
        self.overall = 0;
        self.last_error = error;
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = IngestionState {
            generation: self.generation + 1,
            ..IngestionState::default()
        };
    }
}

/// Mean of `per_file`, rounded half-up, held at 99 until every file is at 100.
///
/// ```rust
/// use lms_ingest::overall_progress;
///
/// assert_eq!(overall_progress(&[]), 0);
/// assert_eq!(overall_progress(&[10, 15]), 13);
/// assert_eq!(overall_progress(&[100, 100, 99]), 99);
/// assert_eq!(overall_progress(&[100, 100, 100]), 100);
/// ```
pub fn overall_progress(per_file: &[u8]) -> u8 {
    if per_file.is_empty() {
        return 0;
    }
    let n = per_file.len() as u64;
    let sum: u64 = per_file.iter().map(|&p| u64::from(p.min(100))).sum();
    let rounded = ((2 * sum + n) / (2 * n)) as u8;
    if rounded >= 100 && per_file.iter().any(|&p| p < 100) {
        99
    } else {
        rounded
    }
}

/// State plus the channel it is published on.
#[derive(Debug)]
pub(crate) struct SharedState {
    state: Mutex<IngestionState>,
    tx: watch::Sender<ProgressSnapshot>,
}

impl SharedState {
    pub(crate) fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Arc::new(Self {
            state: Mutex::new(IngestionState::default()),
            tx,
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, IngestionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn publish(&self, state: &IngestionState) {
        self.tx.send_replace(state.snapshot());
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }
}
