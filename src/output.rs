//! Results of a summarisation run.

use crate::gateway::Usage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One input file's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    /// The `*.json` file that was summarised.
    pub input: PathBuf,
    /// The `{name}-summary.pdf` report that was written.
    pub output: PathBuf,
    /// Summary text as rendered into the report.
    pub summary: String,
    /// Character count of the raw gateway answer.
    pub summary_chars: usize,
    /// Pages in the rendered report.
    pub pages: usize,
    pub usage: Usage,
    pub duration_ms: u64,
}

/// Everything a successful run produced. A failed run produces no report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub files: Vec<FileSummary>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

impl RunReport {
    pub fn push(&mut self, file: FileSummary) {
        self.total_input_tokens += file.usage.input_tokens;
        self.total_output_tokens += file.usage.output_tokens;
        self.total_cost_usd += file.usage.estimated_cost_usd;
        self.files.push(file);
    }
}
