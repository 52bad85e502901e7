//! Data-URI transport encoding.
//!
//! Encoded files carry their contents as `data:<media type>;base64,<payload>`,
//! the same shape a browser's `FileReader.readAsDataURL` produces. Files with
//! an unknown media type are labelled `application/octet-stream`.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use ingest::{EncodedFile, FileDescriptor};
use thiserror::Error;

/// Media type written for files that did not report one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Errors from [`decode_data_uri`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("content does not start with \"data:\"")]
    MissingScheme,

    #[error("data URI has no ',' separating header and payload")]
    MissingPayload,

    #[error("data URI is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encodes `contents` as a base64 data URI.
///
/// ```rust
/// use lms_ingest::encode_data_uri;
///
/// assert_eq!(encode_data_uri("text/plain", b"hi"), "data:text/plain;base64,aGk=");
/// assert_eq!(encode_data_uri("", b""), "data:application/octet-stream;base64,");
/// ```
pub fn encode_data_uri(media_type: &str, contents: &[u8]) -> String {
    let media_type = if media_type.trim().is_empty() {
        DEFAULT_MEDIA_TYPE
    } else {
        media_type
    };
    format!(
        "{SCHEME}{media_type}{BASE64_MARKER},{}",
        STANDARD.encode(contents)
    )
}

/// Splits a base64 data URI back into its media type and raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Bytes), DecodeError> {
    let rest = uri.strip_prefix(SCHEME).ok_or(DecodeError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DecodeError::MissingPayload)?;
    let media_type = header
        .strip_suffix(BASE64_MARKER)
        .ok_or(DecodeError::NotBase64)?;
    let media_type = if media_type.is_empty() {
        DEFAULT_MEDIA_TYPE
    } else {
        media_type
    };
    let bytes = STANDARD.decode(payload)?;
    Ok((media_type.to_string(), Bytes::from(bytes)))
}

/// Builds the [`EncodedFile`] record for `file` from its raw contents.
///
/// `size_bytes` is the length of `contents`, not the size declared at
/// selection.
pub fn encode_file(file: &FileDescriptor, contents: &[u8]) -> EncodedFile {
    EncodedFile {
        name: file.name.clone(),
        size_bytes: contents.len() as u64,
        media_type: file.media_type.clone(),
        last_modified: file.last_modified,
        content: encode_data_uri(&file.media_type, contents),
    }
}
