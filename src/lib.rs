//! # llm-summarizer
//!
//! Summarise JSON datasets with an LLM and render each summary as a PDF
//! report.
//!
//! For every `*.json` file in an input directory the library asks an LLM
//! gateway for a plain-text summary (overview, data structure, key insights,
//! potential uses) and writes `{name}-summary.pdf` to an output directory.
//! Files are processed one at a time; the first failure ends the run.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover    list *.json files
//!  ├─ 2. Load        read bytes, check well-formed JSON
//!  ├─ 3. Summarise   one gateway call per file (governor or direct provider)
//!  ├─ 4. Clean       strip stray Markdown, map to the PDF font's charset
//!  ├─ 5. Layout      title, metadata line, rule, wrapped body on A4 pages
//!  └─ 6. Render      printpdf → {name}-summary.pdf (atomic write)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_summarizer::{run, SummarizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SummarizerConfig::builder()
//!         .input_dir("/data/in")
//!         .output_dir("/data/out")
//!         .execution_run_id("run-42")
//!         .governor_endpoint("https://governor.internal/invoke")
//!         .build()?;
//!     let report = run(&config).await?;
//!     eprintln!("{} reports, ${:.4}", report.files.len(), report.total_cost_usd);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `llm-summarizer` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `lambda` | on      | Event-invocation mode through the AWS Lambda runtime |
//!
//! Disable both when using only the library:
//! ```toml
//! llm-summarizer = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod gateway;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    DocumentPresentation, EntryMode, ProcessorEvent, SummarizerConfig, SummarizerConfigBuilder,
};
pub use error::{GatewayError, SummarizerError};
pub use gateway::{InvokeRequest, InvokeResponse, SummaryGateway, Usage};
pub use output::{FileSummary, RunReport};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{run, run_sync, run_with_gateway, summarize_file};
