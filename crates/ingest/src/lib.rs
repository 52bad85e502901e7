//! LMS Ingest Layer
//!
//! This is where user-selected files enter the upload pipeline. We take a raw
//! selection, check every file against a [`ValidationPolicy`], and split the
//! selection into files we accept and files we reject (with reasons).
//!
//! ## What we do here
//!
//! - **Describe files** - [`FileDescriptor`] carries name, size, media type and
//!   an opaque [`FileHandle`] to the contents.
//! - **Validate** - [`validate`] applies the type and size rules and returns
//!   every violated rule, never just the first.
//! - **Partition** - [`partition`] splits a selection, applies the single-file
//!   cap *after* validation, and builds one aggregate error message.
//! - **Format sizes** - [`format_file_size`] renders byte counts in base-1024
//!   units for messages and hints.
//! - **Classify** - [`FileKind`] and [`media_type_for_name`] for files that
//!   arrive without a media type.
//!
//! Everything in this crate is synchronous and side-effect free (apart from
//! `tracing` events). Encoding, progress and delivery live in the
//! `lms-ingest` crate.
//!
//! ## Example
//!
//! ```
//! use ingest::{partition, FileDescriptor, ValidationPolicy};
//!
//! let policy = ValidationPolicy::default()
//!     .with_allowed_types(["application/pdf"])
//!     .with_max_size_bytes(1024 * 1024)
//!     .with_allow_multiple(true);
//!
//! let selection = vec![
//!     FileDescriptor::from_bytes("week1.pdf", "application/pdf", vec![0u8; 512]),
//!     FileDescriptor::from_bytes("cat.gif", "image/gif", vec![0u8; 512]),
//! ];
//!
//! let result = partition(selection, &policy);
//! assert_eq!(result.accepted.len(), 1);
//! assert_eq!(
//!     result.error_message.as_deref(),
//!     Some("cat.gif: File type not allowed. Allowed types: application/pdf")
//! );
//! ```
mod config;
mod format;
mod kind;
mod types;
mod validate;

pub use crate::config::{PolicyError, ValidationPolicy};
pub use crate::format::format_file_size;
pub use crate::kind::{media_type_for_name, FileKind};
pub use crate::types::{EncodedFile, FileDescriptor, FileHandle, Upload};
pub use crate::validate::{partition, validate, Partition, Violation, MESSAGE_SEPARATOR};
