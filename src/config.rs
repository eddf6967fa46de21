//! Run configuration and entry-mode detection.
//!
//! A run is controlled by one [`SummarizerConfig`], built once at startup and
//! passed by reference into the pipeline. It comes from one of two places:
//!
//! * **Direct invocation**: [`SummarizerConfig::from_env`] reads
//!   `INPUT_DIR`, `OUTPUT_DIR`, `EXECUTION_RUN_ID` and
//!   `LLM_GOVERNOR_FUNCTION` from the process environment.
//! * **Event invocation**: [`SummarizerConfig::from_event`] takes the
//!   directories and run id from the orchestrator's [`ProcessorEvent`] and
//!   only the gateway settings from the environment.
//!
//! Both constructors accept a lookup closure instead of reading the
//! environment themselves, so tests never touch process-global state.

use crate::error::SummarizerError;
use crate::gateway::{SummaryGateway, DEFAULT_MAX_TOKENS, HAIKU_MODEL};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const INPUT_DIR_ENV: &str = "INPUT_DIR";
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";
pub const EXECUTION_RUN_ID_ENV: &str = "EXECUTION_RUN_ID";
pub const GOVERNOR_ENV: &str = "LLM_GOVERNOR_FUNCTION";
pub const PROVIDER_ENV: &str = "SUMMARIZER_PROVIDER";

/// Set by the Lambda runtime; its presence means we were invoked by an event.
pub const LAMBDA_RUNTIME_MARKER: &str = "AWS_LAMBDA_RUNTIME_API";

/// Configuration for one summarisation run.
///
/// Built via [`SummarizerConfig::builder()`], [`SummarizerConfig::from_env()`]
/// or [`SummarizerConfig::from_event()`].
///
/// # Example
/// ```rust
/// use llm_summarizer::SummarizerConfig;
///
/// let config = SummarizerConfig::builder()
///     .input_dir("/data/in")
///     .output_dir("/data/out")
///     .execution_run_id("run-1")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2048);
/// ```
#[derive(Clone)]
pub struct SummarizerConfig {
    /// Directory scanned for `*.json` inputs. Required.
    pub input_dir: PathBuf,

    /// Directory receiving `{name}-summary.pdf` reports. Required; created if missing.
    pub output_dir: PathBuf,

    /// Passed to the gateway for cost attribution. Not interpreted here.
    pub execution_run_id: Option<String>,

    /// Governor endpoint URL (`LLM_GOVERNOR_FUNCTION`).
    pub governor_endpoint: Option<String>,

    /// Provider name for direct `edgequake-llm` access when no governor is set.
    pub provider_name: Option<String>,

    /// Pre-constructed gateway. Takes precedence over everything else.
    pub gateway: Option<Arc<dyn SummaryGateway>>,

    /// Model identifier sent with every request. Default: [`HAIKU_MODEL`].
    pub model: String,

    /// Ceiling on generated tokens per summary. Default: 2048.
    pub max_tokens: usize,

    /// How the document reaches the model. Default: [`DocumentPresentation::Attached`].
    pub presentation: DocumentPresentation,

    /// Per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            execution_run_id: None,
            governor_endpoint: None,
            provider_name: None,
            gateway: None,
            model: HAIKU_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            presentation: DocumentPresentation::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("execution_run_id", &self.execution_run_id)
            .field("governor_endpoint", &self.governor_endpoint)
            .field("provider_name", &self.provider_name)
            .field("gateway", &self.gateway.as_ref().map(|g| g.name().to_string()))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("presentation", &self.presentation)
            .finish()
    }
}

impl SummarizerConfig {
    /// Create a new builder for `SummarizerConfig`.
    pub fn builder() -> SummarizerConfigBuilder {
        SummarizerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Direct-invocation configuration from the process environment.
    pub fn from_env() -> Result<Self, SummarizerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Direct-invocation configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SummarizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder().gateway_from_lookup(&get);
        if let Some(dir) = get(INPUT_DIR_ENV) {
            builder = builder.input_dir(dir);
        }
        if let Some(dir) = get(OUTPUT_DIR_ENV) {
            builder = builder.output_dir(dir);
        }
        if let Some(id) = get(EXECUTION_RUN_ID_ENV) {
            builder = builder.execution_run_id(id);
        }
        builder.build()
    }

    /// Event-invocation configuration: directories and run id from the
    /// payload, gateway settings from `lookup`.
    pub fn from_event<F>(event: &ProcessorEvent, lookup: F) -> Result<Self, SummarizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder()
            .gateway_from_lookup(&get)
            .input_dir(event.input_dir.as_str())
            .output_dir(event.output_dir.as_str());
        if !event.execution_run_id.is_empty() {
            builder = builder.execution_run_id(event.execution_run_id.as_str());
        }
        builder.build()
    }
}

/// Builder for [`SummarizerConfig`].
#[derive(Debug)]
pub struct SummarizerConfigBuilder {
    config: SummarizerConfig,
}

impl SummarizerConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn execution_run_id(mut self, id: impl Into<String>) -> Self {
        self.config.execution_run_id = Some(id.into());
        self
    }

    pub fn governor_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.governor_endpoint = Some(endpoint.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn SummaryGateway>) -> Self {
        self.config.gateway = Some(gateway);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn presentation(mut self, presentation: DocumentPresentation) -> Self {
        self.config.presentation = presentation;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    fn gateway_from_lookup<F>(mut self, get: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = get(GOVERNOR_ENV) {
            self = self.governor_endpoint(endpoint);
        }
        if let Some(name) = get(PROVIDER_ENV) {
            self = self.provider_name(name);
        }
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummarizerConfig, SummarizerError> {
        let c = &self.config;
        if c.input_dir.as_os_str().is_empty() || c.output_dir.as_os_str().is_empty() {
            return Err(SummarizerError::InvalidConfig(
                "inputDir and outputDir are required".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(SummarizerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(SummarizerError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How a document is presented to the model.
///
/// | Strategy | Request | Trade-off |
/// |----------|---------|-----------|
/// | `Attached` | raw bytes as a document block + outline instruction | byte-exact input, the gateway decides how to tokenise it |
/// | `Inline` | pretty-printed JSON inside the prompt text | works with any text-only model, indentation costs extra tokens |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentPresentation {
    /// Raw file bytes as a named document block. (default)
    #[default]
    Attached,
    /// Pretty-printed JSON embedded in the prompt.
    Inline,
}

/// How this process was started. Decided once, never re-queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Standalone command; configuration from the environment.
    Direct,
    /// Orchestrator event through the Lambda runtime.
    Event,
}

impl EntryMode {
    /// Inspect the process environment for the Lambda runtime marker.
    pub fn detect() -> Self {
        Self::from_marker(std::env::var(LAMBDA_RUNTIME_MARKER).ok().as_deref())
    }

    /// Event mode whenever the marker is set to anything non-empty,
    /// whitespace included.
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker {
            Some(v) if !v.is_empty() => EntryMode::Event,
            _ => EntryMode::Direct,
        }
    }
}

/// Payload sent by the workflow orchestrator in event-invocation mode.
///
/// `compute_node_id` and the two tokens belong to the payload shape but are
/// not used by the pipeline. Tokens are redacted from `Debug` output.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorEvent {
    pub input_dir: String,
    pub output_dir: String,
    pub execution_run_id: String,
    pub compute_node_id: String,
    pub session_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for ProcessorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ProcessorEvent")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("execution_run_id", &self.execution_run_id)
            .field("compute_node_id", &self.compute_node_id)
            .field("session_token", &redact(&self.session_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}
