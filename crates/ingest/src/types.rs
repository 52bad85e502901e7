//! Core data model types for the ingest crate.
//!
//! These types describe what a caller hands to the pipeline (a selection of
//! [`FileDescriptor`]s) and what comes back out of it ([`EncodedFile`] records,
//! wrapped in an [`Upload`]).
//!
//! # Type Hierarchy
//!
//! ```text
//! FileDescriptor
//! ├── name: String
//! ├── size_bytes: u64
//! ├── media_type: String          ("" = unknown)
//! ├── last_modified: Option<DateTime<Utc>>
//! └── handle: FileHandle
//!     ├── Memory(Bytes)
//!     └── Path(PathBuf)
//!
//!         ↓ validate / encode
//!
//! EncodedFile
//! ├── name, size_bytes, media_type, last_modified
//! └── content: String             ("data:<type>;base64,<payload>")
//! ```
//!
//! # Examples
//!
//! ```rust
//! use ingest::FileDescriptor;
//!
//! let file = FileDescriptor::from_bytes("notes.txt", "text/plain", "week one".as_bytes().to_vec());
//! assert_eq!(file.size_bytes, 8);
//! assert_eq!(file.media_type, "text/plain");
//! ```
use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle to the raw contents of a selected file.
///
/// The pipeline never looks inside a handle itself; a `FileSource` turns it
/// into bytes. The in-memory variant is reference counted, so cloning a
/// descriptor does not copy file contents.
#[derive(Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileHandle {
    /// Contents already held in memory (e.g. a browser `File` read eagerly).
    Memory(Bytes),
    /// Contents that live on the local filesystem.
    Path(PathBuf),
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileHandle::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            FileHandle::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

/// A caller-supplied file selected for ingestion.
///
/// Descriptors are immutable once submitted. `name` is expected to be
/// non-empty and unique within a selection; neither is re-checked here.
///
/// # Examples
///
/// ```rust
/// use ingest::{FileDescriptor, FileHandle};
///
/// let on_disk = FileDescriptor::new(
///     "syllabus.pdf",
///     52_000,
///     "application/pdf",
///     FileHandle::Path("/tmp/syllabus.pdf".into()),
/// );
/// assert_eq!(on_disk.name, "syllabus.pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Display name of the file, including its extension.
    pub name: String,
    /// Size in bytes as reported at selection time.
    pub size_bytes: u64,
    /// Media (MIME) type; empty when the selection did not report one.
    pub media_type: String,
    /// Last modification time, when known.
    pub last_modified: Option<DateTime<Utc>>,
    /// Handle to the raw contents.
    pub handle: FileHandle,
}

impl FileDescriptor {
    /// Creates a descriptor from its parts.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        media_type: impl Into<String>,
        handle: FileHandle,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            media_type: media_type.into(),
            last_modified: None,
            handle,
        }
    }

    /// Creates an in-memory descriptor whose size is taken from `contents`.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        let contents = contents.into();
        Self::new(
            name,
            contents.len() as u64,
            media_type,
            FileHandle::Memory(contents),
        )
    }

    /// Sets the last modification time.
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

/// A successfully encoded file, ready to hand to the caller.
///
/// `content` is a self-describing data URI (`data:<type>;base64,<payload>`),
/// so the record can be stored as JSON and turned back into bytes later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedFile {
    /// File name as selected.
    pub name: String,
    /// Size in bytes of the raw contents.
    pub size_bytes: u64,
    /// Media type as selected (may be empty).
    pub media_type: String,
    /// Last modification time, when the selection reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Encoded payload.
    pub content: String,
}

/// What a successful ingest hands back.
///
/// Single-file policies yield [`Upload::Single`]; multi-file policies always
/// yield [`Upload::Batch`] in submission order, even for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    /// The sole encoded file of a single-file selection.
    Single(EncodedFile),
    /// All encoded files of a multi-file selection, in submission order.
    Batch(Vec<EncodedFile>),
}

impl Upload {
    /// Number of encoded files carried.
    pub fn len(&self) -> usize {
        match self {
            Upload::Single(_) => 1,
            Upload::Batch(files) => files.len(),
        }
    }

    /// Whether no files are carried (only possible for an empty batch).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into a vector regardless of mode.
    pub fn into_files(self) -> Vec<EncodedFile> {
        match self {
            Upload::Single(file) => vec![file],
            Upload::Batch(files) => files,
        }
    }
}
