//! Document loading: read an input file and confirm it is well-formed JSON.
//!
//! The raw bytes are kept alongside the parsed value. The attached-document
//! strategy forwards the bytes untouched; the inline strategy uses the parsed
//! value to pretty-print.

use crate::error::SummarizerError;
use crate::pipeline::discover::base_name;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated input document.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    /// Base name (`patients` for `patients.json`); used for the document
    /// block name, the report title and the report file name.
    pub name: String,
    pub bytes: Vec<u8>,
    pub value: Value,
}

impl LoadedDocument {
    /// Two-space indented rendering of the parsed value.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.value)
            .unwrap_or_else(|_| String::from_utf8_lossy(&self.bytes).into_owned())
    }

    /// Input file name, for logs and error messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Read `path` fully and parse it as JSON.
///
/// # Errors
/// - [`SummarizerError::PermissionDenied`] / [`SummarizerError::ReadFailed`] on I/O failure
/// - [`SummarizerError::InvalidJson`] if the bytes are not well-formed JSON
pub async fn load_document(path: &Path) -> Result<LoadedDocument, SummarizerError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => SummarizerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SummarizerError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    parse_document(path, bytes)
}

/// Validate already-read bytes.
pub fn parse_document(path: &Path, bytes: Vec<u8>) -> Result<LoadedDocument, SummarizerError> {
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| SummarizerError::InvalidJson {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Loaded {} ({} bytes)", path.display(), bytes.len());

    Ok(LoadedDocument {
        path: path.to_path_buf(),
        name: base_name(path),
        bytes,
        value,
    })
}
