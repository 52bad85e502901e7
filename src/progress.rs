//! Per-file progress drivers.
//!
//! A [`ProgressDriver`] turns one selected file into its raw bytes while
//! moving that file's progress from 0 to 100 through a [`ProgressReporter`].
//! Two strategies exist and are picked by configuration ([`ProgressMode`]):
//!
//! - [`SteppedDriver`] reads the file, then advances in fixed steps on a fixed
//!   interval. This mirrors a picker that shows progress as a paced animation.
//! - [`TransferDriver`] derives progress from the bytes the source actually
//!   delivers, chunk by chunk.
//!
//! Both end at exactly 100 on success and leave progress where it stopped on
//! failure.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ingest::FileDescriptor;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SourceError;
use crate::source::FileSource;
use crate::state::SharedState;

/// Default increment of [`SteppedDriver`], in percent.
pub const DEFAULT_STEP: u8 = 10;
/// Default pause between increments of [`SteppedDriver`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
/// Default read size of [`TransferDriver`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Handle through which one file's task publishes its progress.
///
/// A reporter is bound to a single file index and to the invocation that
/// created it. Values are clamped to 100; values that do not increase the
/// file's progress, and any value sent after the invocation was superseded
/// (by a reset or a newer `ingest`), are dropped.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    shared: Arc<SharedState>,
    generation: u64,
    index: usize,
}

impl ProgressReporter {
    pub(crate) fn new(shared: Arc<SharedState>, generation: u64, index: usize) -> Self {
        Self {
            shared,
            generation,
            index,
        }
    }

    /// Position of the file in the selection.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Publishes `percent` for this file. Returns whether it was applied.
    pub fn report(&self, percent: u8) -> bool {
        let percent = percent.min(100);
        let mut state = self.shared.lock();
        let applied = state.record_progress(self.generation, self.index, percent);
        if applied {
            self.shared.publish(&state);
            trace!(
                index = self.index,
                percent,
                overall = state.overall_progress(),
                "progress"
            );
        }
        applied
    }
}

/// Strategy that reads one file and drives its progress to 100.
#[async_trait]
pub trait ProgressDriver: Send + Sync {
    /// Reads `file` through `source`, reporting progress as it goes.
    async fn drive(
        &self,
        source: &dyn FileSource,
        file: &FileDescriptor,
        progress: &ProgressReporter,
    ) -> Result<Bytes, SourceError>;
}

/// Paced progress: read first, then `step` percent every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteppedDriver {
    step: u8,
    interval: Duration,
}

impl SteppedDriver {
    /// `step` is clamped to `1..=100`.
    pub fn new(step: u8, interval: Duration) -> Self {
        Self {
            step: step.clamp(1, 100),
            interval,
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SteppedDriver {
    fn default() -> Self {
        Self::new(DEFAULT_STEP, DEFAULT_INTERVAL)
    }
}

#[async_trait]
impl ProgressDriver for SteppedDriver {
    async fn drive(
        &self,
        source: &dyn FileSource,
        file: &FileDescriptor,
        progress: &ProgressReporter,
    ) -> Result<Bytes, SourceError> {
        let contents = source.read(file).await?;

        let mut current = 0u8;
        while current < 100 {
            tokio::time::sleep(self.interval).await;
            current = current.saturating_add(self.step).min(100);
            progress.report(current);
        }
        Ok(contents)
    }
}

/// Progress proportional to bytes delivered by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDriver {
    chunk_size: usize,
}

impl TransferDriver {
    /// `chunk_size` of zero is treated as one byte.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for TransferDriver {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[async_trait]
impl ProgressDriver for TransferDriver {
    async fn drive(
        &self,
        source: &dyn FileSource,
        file: &FileDescriptor,
        progress: &ProgressReporter,
    ) -> Result<Bytes, SourceError> {
        let mut on_chunk = |read: u64, total: u64| {
            if total > 0 {
                // 100 is only reported once the whole read has returned.
                let percent = (read.min(total) * 100 / total).min(99) as u8;
                progress.report(percent);
            }
        };
        let contents = source
            .read_chunked(file, self.chunk_size, &mut on_chunk)
            .await?;
        progress.report(100);
        Ok(contents)
    }
}

/// Configured progress strategy.
///
/// ```yaml
/// progress:
///   mode: stepped
///   step: 15
///   interval_ms: 200
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProgressMode {
    Stepped {
        #[serde(default = "default_step")]
        step: u8,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
    },
    Transfer {
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
    },
}

fn default_step() -> u8 {
    DEFAULT_STEP
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for ProgressMode {
    fn default() -> Self {
        ProgressMode::Stepped {
            step: DEFAULT_STEP,
            interval_ms: default_interval_ms(),
        }
    }
}

impl ProgressMode {
    /// Checks ranges the drivers would otherwise silently clamp.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            ProgressMode::Stepped { step, .. } if !(1..=100).contains(&step) => {
                Err(format!("progress.step must be within 1..=100, got {step}"))
            }
            ProgressMode::Transfer { chunk_size: 0 } => {
                Err("progress.chunk_size must be greater than zero".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Instantiates the driver for this mode.
    pub fn build(&self) -> Arc<dyn ProgressDriver> {
        match *self {
            ProgressMode::Stepped { step, interval_ms } => {
                Arc::new(SteppedDriver::new(step, Duration::from_millis(interval_ms)))
            }
            ProgressMode::Transfer { chunk_size } => Arc::new(TransferDriver::new(chunk_size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HandleSource;
    use tokio::time::Instant;

    fn encoding(files: Vec<FileDescriptor>) -> (Arc<SharedState>, u64) {
        let shared = SharedState::new();
        let generation = {
            let mut state = shared.lock();
            state.replace_selection(files, None);
            state.begin_encoding().expect("non-empty").0
        };
        (shared, generation)
    }

    #[tokio::test(start_paused = true)]
    async fn stepped_driver_reaches_exactly_100() {
        let file = FileDescriptor::from_bytes("a.txt", "text/plain", b"hello".to_vec());
        let (shared, generation) = encoding(vec![file.clone()]);
        let reporter = ProgressReporter::new(Arc::clone(&shared), generation, 0);

        let driver = SteppedDriver::new(30, Duration::from_millis(100));
        let started = Instant::now();
        let bytes = driver
            .drive(&HandleSource, &file, &reporter)
            .await
            .expect("in-memory read");

        assert_eq!(&bytes[..], b"hello");
        assert_eq!(shared.lock().per_file_progress(), &[100]);
        // 30, 60, 90, 100
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn transfer_driver_ends_at_100() {
        let file = FileDescriptor::from_bytes("b.bin", "", vec![7u8; 10_000]);
        let (shared, generation) = encoding(vec![file.clone()]);
        let reporter = ProgressReporter::new(Arc::clone(&shared), generation, 0);

        let bytes = TransferDriver::new(1024)
            .drive(&HandleSource, &file, &reporter)
            .await
            .expect("in-memory read");

        assert_eq!(bytes.len(), 10_000);
        assert_eq!(shared.lock().per_file_progress(), &[100]);
        assert_eq!(shared.lock().overall_progress(), 100);
    }

    #[test]
    fn stale_reporter_is_ignored() {
        let file = FileDescriptor::from_bytes("c.txt", "text/plain", b"c".to_vec());
        let (shared, generation) = encoding(vec![file]);
        let reporter = ProgressReporter::new(Arc::clone(&shared), generation, 0);

        shared.lock().reset();
        assert!(!reporter.report(50));
        assert!(shared.lock().per_file_progress().is_empty());
    }

    #[test]
    fn mode_defaults_and_validation() {
        assert_eq!(
            ProgressMode::default(),
            ProgressMode::Stepped {
                step: 10,
                interval_ms: 100
            }
        );
        assert!(ProgressMode::Stepped {
            step: 0,
            interval_ms: 5
        }
        .validate()
        .is_err());
        assert!(ProgressMode::Transfer { chunk_size: 0 }.validate().is_err());
        assert!(ProgressMode::Transfer { chunk_size: 1 }.validate().is_ok());
    }

    #[test]
    fn mode_deserializes_with_field_defaults() {
        let mode: ProgressMode =
            serde_json::from_str(r#"{"mode": "transfer"}"#).expect("valid mode");
        assert_eq!(
            mode,
            ProgressMode::Transfer {
                chunk_size: DEFAULT_CHUNK_SIZE
            }
        );
    }
}
