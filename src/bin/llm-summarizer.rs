//! CLI binary for llm-summarizer.
//!
//! A thin shim over the library crate. Under the Lambda runtime it serves
//! orchestrator events; otherwise it maps CLI flags (each with an
//! environment fallback) to `SummarizerConfig`, runs the batch and prints a
//! summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use llm_summarizer::config::{
    EXECUTION_RUN_ID_ENV, GOVERNOR_ENV, INPUT_DIR_ENV, OUTPUT_DIR_ENV, PROVIDER_ENV,
};
use llm_summarizer::{
    run, DocumentPresentation, EntryMode, ProgressCallback, RunProgressCallback, SummarizerConfig,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being summarised.
    file_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Summarising");
        self.bar.reset_eta();
    }

    fn take_elapsed_secs(&self) -> f64 {
        self.file_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarising {total_files} JSON file(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        *self.file_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        summary_chars: usize,
        cost_usd: f64,
    ) {
        let secs = self.take_elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{summary_chars:>5} chars")),
            dim(&format!("${cost_usd:.4}")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.take_elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_run_complete(&self, total_files: usize) {
        self.bar.finish_and_clear();
        if self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!(
                "{} {} report(s) written",
                green("✔"),
                bold(&total_files.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise every JSON file of a directory through the governor
  llm-summarizer --input-dir ./data --output-dir ./reports \
      --governor https://governor.internal/invoke --execution-run-id run-42

  # Same, configured entirely from the environment
  INPUT_DIR=./data OUTPUT_DIR=./reports EXECUTION_RUN_ID=run-42 \
  LLM_GOVERNOR_FUNCTION=https://governor.internal/invoke llm-summarizer

  # Local run straight against a provider (reads ANTHROPIC_API_KEY)
  llm-summarizer --input-dir ./data --output-dir ./reports --provider anthropic

  # Embed pretty-printed JSON in the prompt instead of attaching the file
  llm-summarizer --input-dir ./data --output-dir ./reports --inline-json

  # Machine-readable run report
  llm-summarizer --input-dir ./data --output-dir ./reports --json > run.json

OUTPUT:
  For every X.json in the input directory, X-summary.pdf is written to the
  output directory (created if missing). Existing reports are overwritten.
  The first failure stops the run with a non-zero exit status.

ENVIRONMENT VARIABLES:
  INPUT_DIR               Directory holding the *.json inputs
  OUTPUT_DIR              Directory receiving the PDF reports
  EXECUTION_RUN_ID        Run identifier forwarded to the gateway
  LLM_GOVERNOR_FUNCTION   Governor endpoint URL (production gateway)
  SUMMARIZER_PROVIDER     Provider for direct calls (anthropic, openai, ...)
  AWS_LAMBDA_RUNTIME_API  Set by AWS Lambda; switches to event mode
  RUST_LOG                Overrides the log filter
"#;

/// Summarise JSON datasets into PDF reports through an LLM gateway.
#[derive(Parser, Debug)]
#[command(
    name = "llm-summarizer",
    version,
    about = "Summarise JSON datasets into PDF reports through an LLM gateway",
    long_about = "Summarise every *.json file of an input directory with an LLM and write one \
PDF report per file. Requests go through the LLM governor named by LLM_GOVERNOR_FUNCTION, or \
straight to a provider with --provider.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory holding the *.json inputs.
    #[arg(long, env = INPUT_DIR_ENV)]
    input_dir: Option<PathBuf>,

    /// Directory receiving {name}-summary.pdf reports.
    #[arg(long, env = OUTPUT_DIR_ENV)]
    output_dir: Option<PathBuf>,

    /// Run identifier forwarded to the gateway for cost attribution.
    #[arg(long, env = EXECUTION_RUN_ID_ENV)]
    execution_run_id: Option<String>,

    /// Governor endpoint URL.
    #[arg(long, env = GOVERNOR_ENV)]
    governor: Option<String>,

    /// Call a provider directly (anthropic, openai, gemini, ollama, ...).
    #[arg(
        long,
        env = PROVIDER_ENV,
        long_help = "Call an LLM provider directly through edgequake-llm instead of the governor.\n\
          Only used when no governor endpoint is set. The provider's API key is read from its usual env var."
    )]
    provider: Option<String>,

    /// Model identifier sent with every request.
    #[arg(long, env = "SUMMARIZER_MODEL")]
    model: Option<String>,

    /// Send pretty-printed JSON inside the prompt instead of attaching the raw file.
    #[arg(long, env = "SUMMARIZER_INLINE_JSON")]
    inline_json: bool,

    /// Max LLM output tokens per summary.
    #[arg(long, env = "SUMMARIZER_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SUMMARIZER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    match EntryMode::detect() {
        EntryMode::Event => serve_events().await,
        EntryMode::Direct => run_direct(Cli::parse()).await,
    }
}

#[cfg(feature = "lambda")]
async fn serve_events() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .without_time()
        .init();

    llm_summarizer::lambda::serve()
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))
}

#[cfg(not(feature = "lambda"))]
async fn serve_events() -> Result<()> {
    anyhow::bail!(
        "{} is set but this binary was built without the `lambda` feature",
        llm_summarizer::config::LAMBDA_RUNTIME_MARKER
    )
}

async fn run_direct(cli: Cli) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is
    // active; the bar prints one line per file instead.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run(&config).await.context("Summarisation run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise run report")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} report(s)  {}ms  →  {}",
            green("✔"),
            report.files.len(),
            report.total_duration_ms,
            bold(&config.output_dir.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out  /  {}",
            dim(&report.total_input_tokens.to_string()),
            dim(&report.total_output_tokens.to_string()),
            dim(&format!("${:.4}", report.total_cost_usd)),
        );
    }

    Ok(())
}

/// Map CLI args to `SummarizerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SummarizerConfig> {
    let presentation = if cli.inline_json {
        DocumentPresentation::Inline
    } else {
        DocumentPresentation::Attached
    };

    let mut builder = SummarizerConfig::builder()
        .max_tokens(cli.max_tokens)
        .presentation(presentation);

    if let Some(ref dir) = cli.input_dir {
        builder = builder.input_dir(dir);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref id) = non_blank(&cli.execution_run_id) {
        builder = builder.execution_run_id(id);
    }
    if let Some(ref url) = non_blank(&cli.governor) {
        builder = builder.governor_endpoint(url);
    }
    if let Some(ref name) = non_blank(&cli.provider) {
        builder = builder.provider_name(name);
    }
    if let Some(ref model) = non_blank(&cli.model) {
        builder = builder.model(model);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
