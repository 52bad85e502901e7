//! File-ingestion pipeline for LMS uploads.
//!
//! This crate takes a user's file selection, validates it against a
//! [`ValidationPolicy`], encodes every accepted file concurrently into a
//! `data:` URI while publishing per-file and overall progress, and hands the
//! result back all at once or not at all.
//!
//! The pure model (descriptors, policy, validation, size formatting) lives in
//! the `ingest` crate and is re-exported here. This crate adds the async
//! parts:
//!
//! - [`IngestionPipeline`]: select / remove / clear / reset / ingest
//! - [`ProgressDriver`] with [`SteppedDriver`] and [`TransferDriver`]
//! - [`FileSource`] and [`DownloadSink`] capabilities with stock
//!   implementations ([`HandleSource`], [`DirectorySink`])
//! - the data-URI codec ([`encode_data_uri`], [`decode_data_uri`])
//! - YAML configuration ([`PipelineConfig`])
//!
//! ```rust
//! use lms_ingest::{
//!     FileDescriptor, HandleSource, IngestionPipeline, Upload, ValidationPolicy,
//! };
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! # rt.block_on(async {
//! let policy = ValidationPolicy::default()
//!     .with_allowed_types(["text/plain"])
//!     .with_allow_multiple(true);
//! let pipeline = IngestionPipeline::new(policy, Arc::new(HandleSource));
//!
//! let outcome = pipeline
//!     .select(vec![
//!         FileDescriptor::from_bytes("a.txt", "text/plain", b"first".to_vec()),
//!         FileDescriptor::from_bytes("b.png", "image/png", vec![0u8; 8]),
//!     ])
//!     .unwrap();
//! assert_eq!(outcome.rejected.len(), 1);
//!
//! match pipeline.ingest().await.unwrap() {
//!     Some(Upload::Batch(files)) => assert_eq!(files[0].name, "a.txt"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # });
//! ```

mod config;
mod encode;
mod error;
mod pipeline;
mod progress;
mod source;
mod state;

pub use ingest::{
    format_file_size, media_type_for_name, partition, validate, EncodedFile, FileDescriptor,
    FileHandle, FileKind, Partition, PolicyError, Upload, ValidationPolicy, Violation,
    MESSAGE_SEPARATOR,
};

pub use crate::config::{ConfigLoadError, LoggingConfig, PipelineConfig};
pub use crate::encode::{decode_data_uri, encode_data_uri, encode_file, DecodeError, DEFAULT_MEDIA_TYPE};
pub use crate::error::{PipelineError, SinkError, SourceError, UNKNOWN_ERROR};
pub use crate::pipeline::IngestionPipeline;
pub use crate::progress::{
    ProgressDriver, ProgressMode, ProgressReporter, SteppedDriver, TransferDriver,
    DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL, DEFAULT_STEP,
};
pub use crate::source::{download, DirectorySink, DownloadSink, FileSource, HandleSource};
pub use crate::state::{overall_progress, IngestionState, Phase, ProgressSnapshot};
