//! Error types for the upload pipeline and its capabilities.
//!
//! Validation problems are not errors here: they come back as data
//! ([`ingest::Violation`]) from selection. What remains are the ways an
//! invocation can go wrong:
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | [`PipelineError::Encoding`] | `ingest` | whole batch discarded |
//! | [`PipelineError::AlreadyEncoding`] | `ingest`, `select`, `clear` | call rejected, state untouched |
//! | [`PipelineError::NotSelecting`] | `remove` during encoding | call rejected |
//! | [`PipelineError::NoSuchFile`] | `remove` | call rejected |
use std::path::PathBuf;

use thiserror::Error;

use crate::encode::DecodeError;
use crate::state::Phase;

/// Message used when a failing file's error carries no text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Errors surfaced by [`IngestionPipeline`](crate::IngestionPipeline).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineError {
    /// A file could not be read or encoded; no file of the batch is delivered.
    #[error("Upload failed: {file_name}: {message}")]
    Encoding {
        /// First failing file, in submission order.
        file_name: String,
        /// Underlying cause, or [`UNKNOWN_ERROR`].
        message: String,
    },

    /// An invocation is already encoding this pipeline's selection.
    #[error("an upload is already in progress")]
    AlreadyEncoding,

    /// The selection can only be edited before encoding starts.
    #[error("selection cannot be changed while {phase:?}")]
    NotSelecting {
        /// Phase at the time of the call.
        phase: Phase,
    },

    /// `remove` was called with an index outside the selection.
    #[error("no selected file at index {index} (selection has {len})")]
    NoSuchFile {
        /// Requested index.
        index: usize,
        /// Selection length at the time of the call.
        len: usize,
    },
}

impl PipelineError {
    /// Builds an [`PipelineError::Encoding`] from a file name and cause.
    pub(crate) fn encoding(file_name: &str, cause: impl ToString) -> Self {
        let message = cause.to_string();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        PipelineError::Encoding {
            file_name: file_name.to_string(),
            message,
        }
    }

    /// True for the error that aborts a batch (as opposed to a rejected call).
    pub fn is_encoding_failure(&self) -> bool {
        matches!(self, PipelineError::Encoding { .. })
    }
}

/// Errors raised by a [`FileSource`](crate::FileSource).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// Reading a file from disk failed.
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source cannot produce the file's contents.
    #[error("{0}")]
    Unreadable(String),
}

/// Errors raised while delivering a download.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The stored content is not a valid data URI.
    #[error("invalid encoded content: {0}")]
    Decode(#[from] DecodeError),

    /// The file name has no usable final component.
    #[error("invalid download name: {0:?}")]
    InvalidName(String),

    /// Writing the file failed.
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_names_file_and_cause() {
        let err = PipelineError::encoding("notes.pdf", "disk on fire");
        assert_eq!(err.to_string(), "Upload failed: notes.pdf: disk on fire");
        assert!(err.is_encoding_failure());
    }

    #[test]
    fn empty_cause_becomes_unknown_error() {
        let err = PipelineError::encoding("a.txt", SourceError::Unreadable(String::new()));
        assert_eq!(err.to_string(), "Upload failed: a.txt: Unknown error");
    }

    #[test]
    fn rejected_calls_are_not_encoding_failures() {
        assert!(!PipelineError::AlreadyEncoding.is_encoding_failure());
        let err = PipelineError::NoSuchFile { index: 3, len: 1 };
        assert_eq!(err.to_string(), "no selected file at index 3 (selection has 1)");
    }
}
