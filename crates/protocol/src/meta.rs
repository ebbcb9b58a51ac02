//! File metadata payload and filename safety checks.
//!
//! A `FILE_META` frame carries a JSON object describing the next file. The
//! `filename` field is a receiver-resolved relative path; it crosses a trust
//! boundary and must pass [`sanitize_filename`] before any filesystem path is
//! derived from it.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME type announced for every file; the protocol never sniffs content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Metadata announced ahead of each file stream.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FileInfo {
    /// Relative path the receiver should persist the file under.
    pub filename: String,
    /// Exact byte length of the file body.
    pub size: u64,
    /// MIME type; always [`OCTET_STREAM`] in practice.
    pub mime: String,
}

impl FileInfo {
    /// Builds metadata with the canonical MIME type.
    #[must_use]
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
            mime: OCTET_STREAM.to_owned(),
        }
    }

    /// Encodes the metadata as the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String, MetaError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses metadata from a received JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, MetaError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Failures decoding or validating file metadata.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The payload was not the expected JSON object.
    #[error("file metadata is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The announced filename would escape the save directory.
    #[error("unsafe filename {0:?} in file metadata")]
    UnsafeFilename(String),
}

/// Validates a received filename and returns it as a relative path.
///
/// Rejects empty names, absolute paths, Windows path prefixes, and any `.` or
/// `..` component, so joining the result onto a save directory can never
/// escape it.
pub fn sanitize_filename(filename: &str) -> Result<&Path, MetaError> {
    let path = Path::new(filename);
    if filename.is_empty() || path.is_absolute() {
        return Err(MetaError::UnsafeFilename(filename.to_owned()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            Component::Prefix(_) | Component::RootDir | Component::CurDir | Component::ParentDir => {
                return Err(MetaError::UnsafeFilename(filename.to_owned()));
            }
        }
    }
    Ok(path)
}
