//! Progress-callback trait for per-file run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::SummarizerConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the input directory. The CLI uses it
//! to drive a terminal progress bar; event-mode runs leave it unset and rely
//! on logs.
//!
//! # Example
//!
//! ```rust
//! use llm_summarizer::{RunProgressCallback, SummarizerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, name: &str, summary_chars: usize, cost_usd: f64) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total} {name}: {summary_chars} chars, ${cost_usd:.4}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = SummarizerConfig::builder()
//!     .input_dir("in")
//!     .output_dir("out")
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each input file.
///
/// Files are processed one at a time, so calls never overlap; the
/// `Send + Sync` bound only lets the callback live inside a shared config.
/// All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after discovery, before the first file.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is read.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the run
    /// * `total`: number of files in the run
    /// * `name`: input file name
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after a file's report has been written.
    ///
    /// # Arguments
    /// * `summary_chars`: character count of the summary
    /// * `cost_usd`: the gateway's cost estimate for the request
    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        summary_chars: usize,
        cost_usd: f64,
    ) {
        let _ = (index, total, name, summary_chars, cost_usd);
    }

    /// Called when a file fails. The run stops right after this call.
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every file has been written.
    fn on_run_complete(&self, total_files: usize) {
        let _ = total_files;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummarizerConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
