//! Error types for the llm-summarizer library.
//!
//! Two error types reflect two different owners of a failure:
//!
//! * [`SummarizerError`]: everything that stops a run: bad configuration,
//!   an empty input directory, an unreadable or malformed file, a failed
//!   report write. Every variant is terminal. The batch never skips a file
//!   and continues; the orchestrator that launched the job retries it as a
//!   whole.
//!
//! * [`GatewayError`]: what the LLM gateway collaborator reported back
//!   (budget exhausted, model not on the allow-list, transport failure).
//!   It is wrapped in [`SummarizerError::Gateway`] together with the file
//!   that was being summarised when it happened.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the llm-summarizer library.
#[derive(Debug, Error)]
pub enum SummarizerError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or environment validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No gateway endpoint or provider was configured.
    #[error("LLM gateway not available: {hint}")]
    GatewayNotConfigured { hint: String },

    // ── Discovery errors ──────────────────────────────────────────────────
    /// The input directory could not be listed.
    #[error("Failed to list JSON files in '{dir}': {source}")]
    ListFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input directory holds no `*.json` file.
    #[error("No JSON files found in input directory '{dir}'")]
    NoInputFiles { dir: PathBuf },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The file was listed but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is not well-formed JSON.
    #[error("Invalid JSON in '{path}': {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Gateway errors ────────────────────────────────────────────────────
    /// The gateway refused or failed the summarisation request for `file`.
    #[error("Summarisation of '{file}' failed: {source}")]
    Gateway {
        file: String,
        #[source]
        source: GatewayError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The PDF document could not be built.
    #[error("Failed to render report '{path}': {detail}")]
    RenderFailed { path: PathBuf, detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure reported by (or while talking to) the LLM gateway.
///
/// Nothing here is retried locally. Resilience is the gateway's job.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// The run's LLM budget is spent.
    #[error("LLM budget exceeded: {message}")]
    BudgetExceeded { message: String },

    /// The requested model is not on the gateway's allow-list.
    #[error("Model '{model}' not allowed. Available models: {allowed:?}")]
    ModelNotAllowed { model: String, allowed: Vec<String> },

    /// Any other error code returned by the gateway.
    #[error("Gateway error [{code}]: {message}")]
    Api { code: String, message: String },

    /// The request never produced a gateway answer (connection refused, reset, DNS).
    #[error("Failed to invoke LLM: {message}")]
    Transport { message: String },

    /// The gateway answered, but not with something we can read.
    #[error("Unreadable gateway response: {message}")]
    InvalidResponse { message: String },
}

impl GatewayError {
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, GatewayError::BudgetExceeded { .. })
    }

    pub fn is_model_not_allowed(&self) -> bool {
        matches!(self, GatewayError::ModelNotAllowed { .. })
    }
}

impl SummarizerError {
    /// The gateway error behind this failure, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            SummarizerError::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_allowed_lists_alternatives() {
        let e = GatewayError::ModelNotAllowed {
            model: "claude-opus".into(),
            allowed: vec!["claude-haiku-4-5".into(), "claude-sonnet-4-5".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("claude-opus"), "got: {msg}");
        assert!(msg.contains("claude-haiku-4-5"), "got: {msg}");
        assert!(msg.contains("claude-sonnet-4-5"), "got: {msg}");
    }

    #[test]
    fn gateway_display_names_file() {
        let e = SummarizerError::Gateway {
            file: "patients.json".into(),
            source: GatewayError::BudgetExceeded {
                message: "monthly cap reached".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("patients.json"), "got: {msg}");
        assert!(msg.contains("budget exceeded"), "got: {msg}");
        assert!(msg.contains("monthly cap reached"), "got: {msg}");
        assert!(e.gateway_error().is_some_and(GatewayError::is_budget_exceeded));
    }

    #[test]
    fn api_error_display() {
        let e = GatewayError::Api {
            code: "throttled".into(),
            message: "slow down".into(),
        };
        assert_eq!(e.to_string(), "Gateway error [throttled]: slow down");
        assert!(!e.is_budget_exceeded());
        assert!(!e.is_model_not_allowed());
    }

    #[test]
    fn no_input_files_display() {
        let e = SummarizerError::NoInputFiles {
            dir: PathBuf::from("/data/in"),
        };
        assert!(e.to_string().contains("/data/in"));
        assert!(e.gateway_error().is_none());
    }
}
