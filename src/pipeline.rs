//! The ingestion pipeline: selection, concurrent encoding and delivery.
//!
//! ```text
//! select(files) ──► partition ──► selected ──ingest()──┬─► drive + encode file 0 ─┐
//!                        │                             ├─► drive + encode file 1 ─┤ join_all
//!                        └─► rejected + message        └─► ...                     ┘
//!                                                               │
//!                                           all ok ─► Upload (submission order)
//!                                           any err ─► PipelineError::Encoding (nothing delivered)
//! ```
//!
//! Per-file tasks are plain futures joined on the caller's task; nothing is
//! spawned. State lives behind a lock that is never held across an await.
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use ingest::{partition, EncodedFile, FileDescriptor, Partition, Upload, ValidationPolicy};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::PipelineConfig;
use crate::encode::encode_file;
use crate::error::{PipelineError, SourceError};
use crate::progress::{ProgressDriver, ProgressReporter, SteppedDriver};
use crate::source::FileSource;
use crate::state::{IngestionState, Phase, ProgressSnapshot, SharedState};

/// Validates selections and encodes them into an [`Upload`].
///
/// One pipeline holds one pending selection. Clone the `Arc` around it to
/// observe it from elsewhere; all methods take `&self`.
///
/// # Example
///
/// ```rust
/// use lms_ingest::{FileDescriptor, HandleSource, IngestionPipeline, Phase, Upload, ValidationPolicy};
/// use std::sync::Arc;
///
/// # tokio_test_block(async {
/// let pipeline = IngestionPipeline::new(ValidationPolicy::default(), Arc::new(HandleSource));
/// pipeline
///     .select(vec![FileDescriptor::from_bytes("hi.txt", "text/plain", b"hi".to_vec())])
///     .unwrap();
///
/// let upload = pipeline.ingest().await.unwrap().unwrap();
/// let Upload::Single(file) = upload else { panic!("single-file policy") };
/// assert_eq!(file.content, "data:text/plain;base64,aGk=");
/// assert_eq!(pipeline.phase(), Phase::Succeeded);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub struct IngestionPipeline {
    policy: ValidationPolicy,
    source: Arc<dyn FileSource>,
    driver: Arc<dyn ProgressDriver>,
    shared: Arc<SharedState>,
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("policy", &self.policy)
            .field("state", &*self.shared.lock())
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    /// Creates a pipeline with the default [`SteppedDriver`].
    pub fn new(policy: ValidationPolicy, source: Arc<dyn FileSource>) -> Self {
        Self {
            policy,
            source,
            driver: Arc::new(SteppedDriver::default()),
            shared: SharedState::new(),
        }
    }

    /// Creates a pipeline from a loaded configuration.
    pub fn from_config(config: &PipelineConfig, source: Arc<dyn FileSource>) -> Self {
        Self::new(config.policy.clone(), source).with_driver(config.progress.build())
    }

    /// Replaces the progress driver.
    pub fn with_driver(mut self, driver: Arc<dyn ProgressDriver>) -> Self {
        self.driver = driver;
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase()
    }

    /// Rejection message of the last selection or reason of the last failure.
    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error().map(str::to_owned)
    }

    /// Copy of the pending selection.
    pub fn selected(&self) -> Vec<FileDescriptor> {
        self.shared.lock().selected().to_vec()
    }

    /// Runs `f` against the state under the lock, for consistent reads of
    /// several fields at once.
    ///
    /// The lock is not reentrant: `f` must not call back into this pipeline,
    /// including formatting it with `{:?}`, or the calling thread deadlocks.
    pub fn with_state<R>(&self, f: impl FnOnce(&IngestionState) -> R) -> R {
        f(&self.shared.lock())
    }

    /// Current phase and progress.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.lock().snapshot()
    }

    /// Receiver that observes the latest published snapshot. Intermediate
    /// values published between two reads are not retained.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.shared.subscribe()
    }

    /// Validates `files` and replaces the pending selection with the accepted
    /// ones. Rejections come back in the returned [`Partition`] and are also
    /// kept as the pipeline's last error.
    pub fn select(&self, files: Vec<FileDescriptor>) -> Result<Partition, PipelineError> {
        let mut state = self.shared.lock();
        if state.phase() == Phase::Encoding {
            return Err(PipelineError::AlreadyEncoding);
        }

        let outcome = partition(files, &self.policy);
        if let Some(message) = &outcome.error_message {
            warn!(
                rejected = outcome.rejected.len(),
                error = %message,
                "selection_rejected"
            );
        }
        state.replace_selection(outcome.accepted.clone(), outcome.error_message.clone());
        self.shared.publish(&state);
        debug!(accepted = outcome.accepted.len(), "selection_replaced");
        Ok(outcome)
    }

    /// Drops the selected file at `index`.
    ///
    /// With nothing selected this is a no-op and returns `Ok(None)`.
    pub fn remove(&self, index: usize) -> Result<Option<FileDescriptor>, PipelineError> {
        let mut state = self.shared.lock();
        let phase = state.phase();
        if phase == Phase::Encoding {
            return Err(PipelineError::NotSelecting { phase });
        }
        let len = state.selected().len();
        if len == 0 {
            return Ok(None);
        }
        if index >= len {
            return Err(PipelineError::NoSuchFile { index, len });
        }
        let removed = state.remove(index);
        self.shared.publish(&state);
        debug!(index, file = %removed.name, "selection_removed");
        Ok(Some(removed))
    }

    /// Empties the selection. The last error is kept.
    pub fn clear(&self) -> Result<(), PipelineError> {
        let mut state = self.shared.lock();
        if state.phase() == Phase::Encoding {
            return Err(PipelineError::AlreadyEncoding);
        }
        state.clear_selection();
        self.shared.publish(&state);
        Ok(())
    }

    /// Returns to `Idle` unconditionally. Any task still running for an
    /// abandoned `ingest` call can no longer change this pipeline's state.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        state.reset();
        self.shared.publish(&state);
        debug!(generation = state.generation(), "pipeline_reset");
    }

    /// Encodes the pending selection.
    ///
    /// Returns `Ok(None)` when nothing is selected. On success every file is
    /// returned in submission order; if any file fails, none are and the
    /// error names the first failing file in submission order. Either way the
    /// selection is empty and progress is back at 0 afterwards.
    pub async fn ingest(&self) -> Result<Option<Upload>, PipelineError> {
        let (generation, files) = {
            let mut state = self.shared.lock();
            if state.phase() == Phase::Encoding {
                return Err(PipelineError::AlreadyEncoding);
            }
            match state.begin_encoding() {
                Some(started) => {
                    self.shared.publish(&state);
                    started
                }
                None => return Ok(None),
            }
        };

        let span = info_span!("ingest.batch", generation, files = files.len());
        self.encode_all(generation, files).instrument(span).await
    }

    async fn encode_all(
        &self,
        generation: u64,
        files: Vec<FileDescriptor>,
    ) -> Result<Option<Upload>, PipelineError> {
        let started = Instant::now();

        let tasks = files.iter().enumerate().map(|(index, file)| {
            let progress = ProgressReporter::new(Arc::clone(&self.shared), generation, index);
            async move {
                let contents = self
                    .driver
                    .drive(self.source.as_ref(), file, &progress)
                    .await?;
                Ok::<EncodedFile, SourceError>(encode_file(file, &contents))
            }
        });
        let results = join_all(tasks).await;

        let mut encoded = Vec::with_capacity(files.len());
        let mut failure = None;
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(done) => encoded.push(done),
                Err(err) => {
                    failure = Some(PipelineError::encoding(&file.name, err));
                    break;
                }
            }
        }

        if let Some(err) = failure {
            if !self.finish(generation, Phase::Failed, Some(err.to_string())) {
                debug!(generation, "stale_failure_discarded");
            }
            let elapsed_micros = started.elapsed().as_micros() as u64;
            warn!(error = %err, elapsed_micros, "ingest_failure");
            return Err(err);
        }

        if !self.finish(generation, Phase::Succeeded, None) {
            debug!(generation, "stale_success_discarded");
        }
        let total_bytes: u64 = encoded.iter().map(|f| f.size_bytes).sum();
        info!(
            files = encoded.len(),
            total_bytes,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "ingest_success"
        );

        let upload = if !self.policy.allow_multiple && encoded.len() == 1 {
            Upload::Single(encoded.remove(0))
        } else {
            Upload::Batch(encoded)
        };
        Ok(Some(upload))
    }

    fn finish(&self, generation: u64, phase: Phase, error: Option<String>) -> bool {
        let mut state = self.shared.lock();
        let applied = state.finish(generation, phase, error);
        if applied {
            self.shared.publish(&state);
        }
        applied
    }
}
