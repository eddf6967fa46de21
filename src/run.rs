//! Batch entry points: summarise every JSON document of a directory.
//!
//! Files are processed one at a time in discovery order. Each file goes
//! through load, summarise, clean and render before the next one is opened.
//! The first failure ends the run: remaining files are not attempted, and
//! the failing file leaves no report behind.

use crate::config::SummarizerConfig;
use crate::error::SummarizerError;
use crate::gateway::{resolve_gateway, SummaryGateway};
use crate::output::{FileSummary, RunReport};
use crate::pipeline::{discover, llm, load, postprocess, render};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Summarise every `*.json` file in `config.input_dir` into
/// `config.output_dir`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every error is fatal to the run:
/// - no gateway configured
/// - input directory unreadable or holding no JSON file
/// - an input file unreadable or not well-formed JSON
/// - the gateway refusing a request (budget, model allow-list, transport)
/// - a report that cannot be rendered or written
pub async fn run(config: &SummarizerConfig) -> Result<RunReport, SummarizerError> {
    let gateway = resolve_gateway(config)?;
    run_with_gateway(config, gateway.as_ref()).await
}

/// [`run`] against an explicit gateway.
pub async fn run_with_gateway(
    config: &SummarizerConfig,
    gateway: &dyn SummaryGateway,
) -> Result<RunReport, SummarizerError> {
    let run_start = Instant::now();
    info!("Starting LLM summarizer");
    info!("Input directory: {}", config.input_dir.display());
    info!("Output directory: {}", config.output_dir.display());
    if let Some(ref id) = config.execution_run_id {
        debug!("Execution run id: {}", id);
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| SummarizerError::OutputWriteFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    let inputs = discover::discover_inputs(&config.input_dir).await?;
    let total = inputs.len();
    info!("Found {} JSON file(s) to process", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut report = RunReport::default();
    for (i, path) in inputs.iter().enumerate() {
        let index = i + 1;
        let name = file_label(path);

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &name);
        }

        match summarize_file(path, gateway, config).await {
            Ok(file) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(
                        index,
                        total,
                        &name,
                        file.summary_chars,
                        file.usage.estimated_cost_usd,
                    );
                }
                report.push(file);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, &name, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    report.total_duration_ms = run_start.elapsed().as_millis() as u64;
    info!(
        "LLM summarizer completed successfully: {} report(s), ${:.4} total, {}ms",
        report.files.len(),
        report.total_cost_usd,
        report.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total);
    }

    Ok(report)
}

/// Load, summarise, clean and render a single document.
///
/// The report lands in `config.output_dir`, which must already exist.
pub async fn summarize_file(
    path: &Path,
    gateway: &dyn SummaryGateway,
    config: &SummarizerConfig,
) -> Result<FileSummary, SummarizerError> {
    let start = Instant::now();
    info!("Processing: {}", path.display());

    let doc = load::load_document(path).await?;

    info!("Sending {} to LLM via {}", doc.file_name(), gateway.name());
    let summary = llm::summarize(gateway, &doc, config).await?;
    let summary_chars = summary.text.chars().count();
    info!(
        "Received summary ({} chars, cost: ${:.4})",
        summary_chars, summary.usage.estimated_cost_usd
    );

    let body = postprocess::clean_summary(&summary.text);
    let title = postprocess::to_base14_charset(&doc.name);
    let output = discover::report_path(&config.output_dir, &doc.name);
    let layout = render::render_report(&output, &title, &body).await?;
    info!("Written: {}", output.display());

    Ok(FileSummary {
        input: path.to_path_buf(),
        output,
        summary: body,
        summary_chars,
        pages: layout.page_count(),
        usage: summary.usage,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &SummarizerConfig) -> Result<RunReport, SummarizerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SummarizerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
