//! Integration tests for the summarisation run against a stub gateway.
//!
//! Every test works in its own temporary input/output directories and never
//! touches the network.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use llm_summarizer::gateway::ContentBlock;
use llm_summarizer::pipeline::render;
use llm_summarizer::{
    run, run_with_gateway, DocumentPresentation, GatewayError, InvokeRequest, InvokeResponse,
    RunProgressCallback, SummarizerConfig, SummarizerError, SummaryGateway, Usage,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Gateway double: answers every request with the same reply and records
/// what it was asked.
struct StubGateway {
    reply: Result<String, GatewayError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<InvokeRequest>>,
}

impl StubGateway {
    fn answering(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn failing(err: GatewayError) -> Self {
        Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> InvokeRequest {
        self.last_request.lock().unwrap().clone().expect("no request recorded")
    }
}

#[async_trait]
impl SummaryGateway for StubGateway {
    fn name(&self) -> &str {
        "stub"
    }

    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.reply.clone().map(|text| {
            InvokeResponse::from_text(
                text,
                Usage {
                    input_tokens: 120,
                    output_tokens: 40,
                    estimated_cost_usd: 0.0003,
                },
            )
        })
    }
}

struct Dirs {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn dirs() -> Dirs {
    let root = tempdir().unwrap();
    let input = root.path().join("in");
    let output = root.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::create_dir(&output).unwrap();
    Dirs {
        _root: root,
        input,
        output,
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn config(d: &Dirs) -> SummarizerConfig {
    SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&d.output)
        .execution_run_id("run-7")
        .build()
        .unwrap()
}

fn output_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Text extracted from every page of the PDF at `path`.
fn pdf_text(path: &Path) -> String {
    let doc = lopdf::Document::load(path).unwrap();
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).unwrap()
}

fn is_pdf(path: &Path) -> bool {
    std::fs::read(path)
        .map(|b| b.starts_with(b"%PDF"))
        .unwrap_or(false)
}

const PATIENTS: &str = r#"{"patients":[{"id":1,"age":54},{"id":2,"age":61}],"study":"x","records":2}"#;
const SUMMARY: &str = "This dataset contains patient records...";

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_report_per_input() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    write(&d.input, "b.json", "[1, 2]");
    write(&d.input, "c.json", PATIENTS);
    let gateway = StubGateway::answering(SUMMARY);

    let report = run_with_gateway(&config(&d), &gateway).await.unwrap();

    assert_eq!(gateway.calls(), 3);
    assert_eq!(report.files.len(), 3);
    assert_eq!(
        output_names(&d.output),
        vec!["a-summary.pdf", "b-summary.pdf", "c-summary.pdf"]
    );
    for f in &report.files {
        assert!(is_pdf(&f.output), "{} is not a PDF", f.output.display());
    }
    assert_eq!(report.total_input_tokens, 360);
    assert_eq!(report.total_output_tokens, 120);
}

#[tokio::test]
async fn patients_example() {
    let d = dirs();
    write(&d.input, "patients.json", PATIENTS);
    let gateway = StubGateway::answering(SUMMARY);

    let report = run_with_gateway(&config(&d), &gateway).await.unwrap();

    let file = &report.files[0];
    assert_eq!(file.output, d.output.join("patients-summary.pdf"));
    assert_eq!(file.summary, SUMMARY);
    assert_eq!(file.summary_chars, SUMMARY.len());
    assert_eq!(file.pages, 1);
    assert!(is_pdf(&file.output));

    let text = pdf_text(&file.output);
    assert!(text.contains("Dataset Summary: patients"), "got: {text}");
    assert!(text.contains(SUMMARY), "got: {text}");
}

#[tokio::test]
async fn report_leads_with_title_and_carries_summary() {
    let d = dirs();
    let path = d.output.join("patients-summary.pdf");

    let layout = render::render_report(&path, "patients", SUMMARY).await.unwrap();

    let first = layout.lines().next().unwrap();
    assert_eq!(first.text, "Dataset Summary: patients");
    assert!(layout.plain_text().contains(SUMMARY));
    assert!(layout.plain_text().contains("by LLM Summarizer"));

    let text = pdf_text(&path);
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap();
    assert_eq!(first_line.trim(), "Dataset Summary: patients");
    assert!(text.contains("by LLM Summarizer"), "got: {text}");
    assert!(text.contains(SUMMARY), "got: {text}");
}

#[tokio::test]
async fn non_json_files_are_ignored() {
    let d = dirs();
    write(&d.input, "data.json", "{}");
    write(&d.input, "notes.txt", "not json");
    write(&d.input, "readme.md", "# hi");
    let gateway = StubGateway::answering(SUMMARY);

    run_with_gateway(&config(&d), &gateway).await.unwrap();

    assert_eq!(gateway.calls(), 1);
    assert_eq!(output_names(&d.output), vec!["data-summary.pdf"]);
}

#[tokio::test]
async fn output_directory_is_created() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let nested = d.output.join("deeper").join("reports");
    let config = SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&nested)
        .build()
        .unwrap();

    run_with_gateway(&config, &StubGateway::answering(SUMMARY))
        .await
        .unwrap();

    assert!(is_pdf(&nested.join("a-summary.pdf")));
}

#[tokio::test]
async fn rerun_overwrites_reports() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let config = config(&d);

    run_with_gateway(&config, &StubGateway::answering("First summary."))
        .await
        .unwrap();
    let report = run_with_gateway(&config, &StubGateway::answering("Second summary."))
        .await
        .unwrap();

    assert_eq!(report.files[0].summary, "Second summary.");
    assert_eq!(output_names(&d.output), vec!["a-summary.pdf"]);
}

#[tokio::test]
async fn markdown_in_answer_is_cleaned() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let gateway = StubGateway::answering("## Overview\n**Two** records \u{2014} both valid.");

    let report = run_with_gateway(&config(&d), &gateway).await.unwrap();

    assert_eq!(report.files[0].summary, "Overview\nTwo records - both valid.");
}

// ── Request shape ────────────────────────────────────────────────────────────

#[tokio::test]
async fn attached_request_carries_raw_bytes_and_run_id() {
    let d = dirs();
    write(&d.input, "patients.json", PATIENTS);
    let gateway = StubGateway::answering(SUMMARY);

    run_with_gateway(&config(&d), &gateway).await.unwrap();

    let req = gateway.last_request();
    assert_eq!(req.model, "claude-haiku-4-5");
    assert_eq!(req.max_tokens, 2048);
    assert_eq!(req.execution_run_id.as_deref(), Some("run-7"));
    assert!(req.system.contains("data analyst"));

    let content = &req.messages[0].content;
    let ContentBlock::Document { name, data, .. } = &content[0] else {
        panic!("expected a document block first, got {content:?}");
    };
    assert_eq!(name, "patients");
    assert_eq!(STANDARD.decode(data).unwrap(), PATIENTS.as_bytes());
}

#[tokio::test]
async fn inline_request_embeds_pretty_json() {
    let d = dirs();
    write(&d.input, "patients.json", PATIENTS);
    let config = SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&d.output)
        .presentation(DocumentPresentation::Inline)
        .build()
        .unwrap();
    let gateway = StubGateway::answering(SUMMARY);

    run_with_gateway(&config, &gateway).await.unwrap();

    let req = gateway.last_request();
    assert_eq!(req.execution_run_id, None);
    let [ContentBlock::Text { text }] = &req.messages[0].content[..] else {
        panic!("expected a single text block");
    };
    assert!(text.contains("\"records\": 2"), "got: {text}");
}

// ── Fatal conditions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_directory_is_fatal() {
    let d = dirs();
    let gateway = StubGateway::answering(SUMMARY);

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(matches!(err, SummarizerError::NoInputFiles { .. }));
    assert_eq!(gateway.calls(), 0);
    assert!(output_names(&d.output).is_empty());
}

#[tokio::test]
async fn only_non_json_files_is_fatal() {
    let d = dirs();
    write(&d.input, "a.txt", "{}");
    write(&d.input, "b.csv", "x,y");
    let gateway = StubGateway::answering(SUMMARY);

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(matches!(err, SummarizerError::NoInputFiles { .. }));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn malformed_json_aborts_before_gateway() {
    let d = dirs();
    write(&d.input, "bad.json", r#"{"a":"#);
    let gateway = StubGateway::answering(SUMMARY);

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(matches!(err, SummarizerError::InvalidJson { .. }));
    assert_eq!(gateway.calls(), 0);
    assert!(output_names(&d.output).is_empty());
}

#[tokio::test]
async fn budget_exceeded_stops_the_run() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    write(&d.input, "b.json", "{}");
    let gateway = StubGateway::failing(GatewayError::BudgetExceeded {
        message: "run budget of $1.00 spent".into(),
    });

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(err.gateway_error().is_some_and(|g| g.is_budget_exceeded()));
    assert!(err.to_string().contains("a.json"));
    assert_eq!(gateway.calls(), 1);
    assert!(output_names(&d.output).is_empty());
}

#[tokio::test]
async fn model_not_allowed_is_fatal() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let gateway = StubGateway::failing(GatewayError::ModelNotAllowed {
        model: "claude-haiku-4-5".into(),
        allowed: vec!["claude-sonnet-4".into()],
    });

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(err.gateway_error().is_some_and(|g| g.is_model_not_allowed()));
    assert!(err.to_string().contains("Available models"));
}

#[tokio::test]
async fn failure_midway_keeps_earlier_reports() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    write(&d.input, "b.json", "{ broken");
    write(&d.input, "c.json", "{}");
    let gateway = StubGateway::answering(SUMMARY);

    let err = run_with_gateway(&config(&d), &gateway).await.unwrap_err();

    assert!(matches!(err, SummarizerError::InvalidJson { .. }));
    assert_eq!(gateway.calls(), 1);
    assert_eq!(output_names(&d.output), vec!["a-summary.pdf"]);
}

#[tokio::test]
async fn run_without_gateway_is_not_configured() {
    let d = dirs();
    write(&d.input, "a.json", "{}");

    let err = run(&config(&d)).await.unwrap_err();

    assert!(matches!(err, SummarizerError::GatewayNotConfigured { .. }));
    assert!(output_names(&d.output).is_empty());
}

#[tokio::test]
async fn prebuilt_gateway_takes_precedence() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let gateway = Arc::new(StubGateway::answering(SUMMARY));
    let config = SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&d.output)
        .governor_endpoint("http://127.0.0.1:9/unused")
        .gateway(gateway.clone())
        .build()
        .unwrap();

    run(&config).await.unwrap();

    assert_eq!(gateway.calls(), 1);
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl RunProgressCallback for Recorder {
    fn on_run_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start {total_files}"));
    }
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("file {index}/{total} {name}"));
    }
    fn on_file_complete(&self, index: usize, _t: usize, _n: &str, chars: usize, _c: f64) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {index} {chars}"));
    }
    fn on_file_error(&self, index: usize, _t: usize, _n: &str, _e: &str) {
        self.events.lock().unwrap().push(format!("error {index}"));
    }
    fn on_run_complete(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("end {total_files}"));
    }
}

#[tokio::test]
async fn progress_events_in_order() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    write(&d.input, "b.json", "{}");
    let recorder = Arc::new(Recorder::default());
    let config = SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&d.output)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    run_with_gateway(&config, &StubGateway::answering("Short."))
        .await
        .unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start 2",
            "file 1/2 a.json",
            "done 1 6",
            "file 2/2 b.json",
            "done 2 6",
            "end 2",
        ]
    );
}

#[tokio::test]
async fn progress_reports_the_failing_file() {
    let d = dirs();
    write(&d.input, "a.json", "{}");
    let recorder = Arc::new(Recorder::default());
    let config = SummarizerConfig::builder()
        .input_dir(&d.input)
        .output_dir(&d.output)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let gateway = StubGateway::failing(GatewayError::Transport {
        message: "connection reset".into(),
    });

    run_with_gateway(&config, &gateway).await.unwrap_err();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["start 1", "file 1/1 a.json", "error 1"]
    );
}

#[test]
fn sync_wrapper_reports_fatal_errors() {
    let d = dirs();
    write(&d.input, "a.json", "{}");

    let err = llm_summarizer::run_sync(&config(&d)).unwrap_err();

    assert!(matches!(err, SummarizerError::GatewayNotConfigured { .. }));
}
