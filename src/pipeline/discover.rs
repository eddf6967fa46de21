//! Input discovery: list the `*.json` files of the input directory.
//!
//! Only the top level is scanned. Names are matched case-sensitively with
//! [`globset`], so `DATA.JSON` is not an input. The result is sorted by path
//! so two runs over the same directory log in the same order.

use crate::error::SummarizerError;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-name pattern selecting input documents.
pub const INPUT_PATTERN: &str = "*.json";

/// Appended to an input's base name to form its report file name.
pub const REPORT_SUFFIX: &str = "-summary.pdf";

/// List every regular file in `dir` whose name matches [`INPUT_PATTERN`].
///
/// # Errors
/// - [`SummarizerError::ListFailed`] if the directory cannot be read
/// - [`SummarizerError::ReadFailed`] if a matching entry cannot be stat'ed
/// - [`SummarizerError::NoInputFiles`] if nothing matches
pub async fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, SummarizerError> {
    let matcher = input_matcher()?;
    let list_failed = |source| SummarizerError::ListFailed {
        dir: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(list_failed)?;
    let mut inputs = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
        let path = entry.path();
        if !matcher.is_match(entry.file_name()) {
            continue;
        }
        // Follows symlinks, unlike DirEntry::file_type. A match that cannot
        // be stat'ed (dangling link, no permission) is an input that cannot be read.
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| SummarizerError::ReadFailed {
                path: path.clone(),
                source,
            })?;
        if !metadata.is_file() {
            debug!("Skipping non-file match: {}", path.display());
            continue;
        }
        inputs.push(path);
    }

    if inputs.is_empty() {
        return Err(SummarizerError::NoInputFiles {
            dir: dir.to_path_buf(),
        });
    }

    inputs.sort();
    Ok(inputs)
}

fn input_matcher() -> Result<GlobMatcher, SummarizerError> {
    Glob::new(INPUT_PATTERN)
        .map(|g| g.compile_matcher())
        .map_err(|e| SummarizerError::Internal(format!("input pattern: {e}")))
}

/// The input's file name without its final extension: `patients.json` → `patients`.
pub fn base_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, _ext)) => stem.to_string(),
        None => file_name,
    }
}

/// `{output_dir}/{base}-summary.pdf`
pub fn report_path(output_dir: &Path, base: &str) -> PathBuf {
    output_dir.join(format!("{base}{REPORT_SUFFIX}"))
}
