//! Validation policy for file selections.
//!
//! [`ValidationPolicy`] decides which files a selection accepts: which media
//! types are allowed, how large a file may be, and whether more than one file
//! may be accepted at once. Policies are cheap to clone and serialize from
//! external configuration formats such as YAML or JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::ValidationPolicy;
//!
//! let policy = ValidationPolicy::default()
//!     .with_allowed_types(["application/pdf", "image/png"])
//!     .with_max_size_bytes(5 * 1024 * 1024)
//!     .with_allow_multiple(true);
//!
//! policy.validate().expect("policy is consistent");
//! assert_eq!(policy.hint().as_deref(), Some("Allowed types: pdf, png • Max size: 5 MB"));
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::format_file_size;

/// Type/size/multiplicity policy applied to every selected file.
///
/// # Serialization
///
/// ```json
/// {
///   "allowed_types": ["application/pdf"],
///   "max_size_bytes": 10485760,
///   "allow_multiple": false
/// }
/// ```
///
/// Missing fields fall back to [`ValidationPolicy::default()`]: any type, any
/// size, single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Media types accepted verbatim. `None` accepts any type, including an
    /// empty (unknown) one.
    pub allowed_types: Option<Vec<String>>,

    /// Largest accepted file size in bytes (inclusive). `None` is unbounded.
    pub max_size_bytes: Option<u64>,

    /// Whether more than one file may be accepted per selection. When `false`
    /// only the first accepted file is kept.
    pub allow_multiple: bool,
}

/// Errors raised by [`ValidationPolicy::validate`].
///
/// These are configuration-time issues, meant to be surfaced at start-up
/// rather than per selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    /// `allowed_types` is present but lists nothing, which would reject every
    /// file. Use `None` to allow any type.
    #[error("allowed_types is empty; omit it to allow any type")]
    EmptyAllowedTypes,

    /// An entry of `allowed_types` is blank.
    #[error("allowed_types[{index}] is blank")]
    BlankAllowedType {
        /// Position of the offending entry.
        index: usize,
    },
}

impl ValidationPolicy {
    /// Restricts accepted media types.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the inclusive size limit.
    pub fn with_max_size_bytes(mut self, max: u64) -> Self {
        self.max_size_bytes = Some(max);
        self
    }

    /// Enables or disables multi-file selections.
    pub fn with_allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    /// Returns true when `media_type` passes the type rule.
    pub fn allows_type(&self, media_type: &str) -> bool {
        match &self.allowed_types {
            Some(types) => types.iter().any(|t| t == media_type),
            None => true,
        }
    }

    /// Checks the policy for internal consistency.
    ///
    /// ```rust
    /// use ingest::{PolicyError, ValidationPolicy};
    ///
    /// let policy = ValidationPolicy::default().with_allowed_types(Vec::<String>::new());
    /// assert_eq!(policy.validate(), Err(PolicyError::EmptyAllowedTypes));
    /// ```
    pub fn validate(&self) -> Result<(), PolicyError> {
        if let Some(types) = &self.allowed_types {
            if types.is_empty() {
                return Err(PolicyError::EmptyAllowedTypes);
            }
            if let Some(index) = types.iter().position(|t| t.trim().is_empty()) {
                return Err(PolicyError::BlankAllowedType { index });
            }
        }
        Ok(())
    }

    /// Value for an HTML `accept` attribute: allowed types joined by `,`.
    pub fn accept_attribute(&self) -> Option<String> {
        self.allowed_types.as_ref().map(|types| types.join(","))
    }

    /// Short description of the policy for display next to a file picker,
    /// e.g. `"Allowed types: pdf, png • Max size: 5 MB"`.
    ///
    /// Types are shown by their subtype (`application/pdf` → `pdf`).
    pub fn hint(&self) -> Option<String> {
        let types = self.allowed_types.as_ref().map(|types| {
            let short: Vec<&str> = types
                .iter()
                .map(|t| t.split_once('/').map_or(t.as_str(), |(_, sub)| sub))
                .collect();
            format!("Allowed types: {}", short.join(", "))
        });
        let size = self
            .max_size_bytes
            .map(|max| format!("Max size: {}", format_file_size(max)));

        match (types, size) {
            (Some(types), Some(size)) => Some(format!("{types} • {size}")),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }
}
