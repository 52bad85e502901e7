//! Per-file validation and selection partitioning.
//!
//! # Flow
//!
//! ```text
//! raw selection ──► validate() per file ──► accepted ──► single-file cap
//!                                      └──► rejected (Violation per file)
//! ```
//!
//! Every rule is evaluated for every file; violations are accumulated rather
//! than short-circuited, and the single-file cap is applied only after
//! validation so that no rejection message is ever swallowed.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ValidationPolicy;
use crate::format::format_file_size;
use crate::types::FileDescriptor;

/// Separator between messages of one file and between files.
pub const MESSAGE_SEPARATOR: &str = "; ";

/// All policy violations for one rejected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the rejected file.
    pub file_name: String,
    /// Violation messages in rule order. Never empty.
    pub messages: Vec<String>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.file_name,
            self.messages.join(MESSAGE_SEPARATOR)
        )
    }
}

/// Result of splitting a selection with [`partition`].
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Files that passed every rule, in submission order (capped to one file
    /// when the policy disallows multiple files).
    pub accepted: Vec<FileDescriptor>,
    /// One entry per rejected file, in submission order.
    pub rejected: Vec<Violation>,
    /// All violations joined with `"; "`, or `None` when nothing was rejected.
    pub error_message: Option<String>,
}

/// Checks one file against `policy`.
///
/// Returns every violated rule's message; an empty vector means the file is
/// valid. Pure and deterministic.
///
/// # Examples
///
/// ```rust
/// use ingest::{validate, FileDescriptor, ValidationPolicy};
///
/// let policy = ValidationPolicy::default()
///     .with_allowed_types(["application/pdf"])
///     .with_max_size_bytes(1024);
/// let file = FileDescriptor::from_bytes("photo.png", "image/png", vec![0u8; 2048]);
///
/// let messages = validate(&file, &policy);
/// assert_eq!(messages.len(), 2);
/// assert!(messages[0].contains("type not allowed"));
/// assert!(messages[1].contains("too large"));
/// ```
pub fn validate(file: &FileDescriptor, policy: &ValidationPolicy) -> Vec<String> {
    let mut messages = Vec::new();

    if let Some(types) = &policy.allowed_types {
        if !types.iter().any(|t| *t == file.media_type) {
            messages.push(format!(
                "File type not allowed. Allowed types: {}",
                types.join(", ")
            ));
        }
    }

    if let Some(max) = policy.max_size_bytes {
        if file.size_bytes > max {
            messages.push(format!(
                "File size too large. Maximum size: {}",
                format_file_size(max)
            ));
        }
    }

    messages
}

/// Splits a raw selection into accepted files and rejections.
///
/// # Examples
///
/// ```rust
/// use ingest::{partition, FileDescriptor, ValidationPolicy};
///
/// let policy = ValidationPolicy::default().with_allowed_types(["text/plain"]);
/// let selection = vec![
///     FileDescriptor::from_bytes("a.txt", "text/plain", b"a".to_vec()),
///     FileDescriptor::from_bytes("b.png", "image/png", b"b".to_vec()),
///     FileDescriptor::from_bytes("c.txt", "text/plain", b"c".to_vec()),
/// ];
///
/// let result = partition(selection, &policy);
/// assert_eq!(result.accepted.len(), 1); // single-file policy keeps "a.txt"
/// assert_eq!(result.rejected[0].file_name, "b.png");
/// assert!(result.error_message.is_some());
/// ```
pub fn partition(selection: Vec<FileDescriptor>, policy: &ValidationPolicy) -> Partition {
    let submitted = selection.len();
    let mut accepted = Vec::with_capacity(submitted);
    let mut rejected = Vec::new();

    for file in selection {
        let messages = validate(&file, policy);
        if messages.is_empty() {
            accepted.push(file);
        } else {
            rejected.push(Violation {
                file_name: file.name,
                messages,
            });
        }
    }

    let valid = accepted.len();
    if !policy.allow_multiple {
        accepted.truncate(1);
    }

    let error_message = if rejected.is_empty() {
        None
    } else {
        Some(
            rejected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(MESSAGE_SEPARATOR),
        )
    };

    debug!(
        submitted,
        valid,
        accepted = accepted.len(),
        rejected = rejected.len(),
        "selection_partitioned"
    );

    Partition {
        accepted,
        rejected,
        error_message,
    }
}
