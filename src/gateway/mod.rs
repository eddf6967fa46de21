//! The LLM gateway collaborator: request/response shapes and the trait seam.
//!
//! Retry, budget accounting, model allow-listing and authentication all live
//! behind the gateway. This crate only shapes one [`InvokeRequest`] per input
//! file and reads the text and cost back out of the [`InvokeResponse`].
//!
//! Two implementations ship with the crate:
//!
//! * [`governor::GovernorGateway`]: JSON over HTTP to the governor endpoint
//!   named by `LLM_GOVERNOR_FUNCTION`. This is what production runs use.
//! * [`provider::ProviderGateway`]: a direct provider call through
//!   `edgequake-llm`, for local runs where no governor is deployed.
//!
//! Tests inject their own [`SummaryGateway`] through
//! [`crate::config::SummarizerConfigBuilder::gateway`].

pub mod governor;
pub mod provider;

use crate::config::SummarizerConfig;
use crate::error::{GatewayError, SummarizerError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The Haiku model every summary is requested from.
pub const HAIKU_MODEL: &str = "claude-haiku-4-5";

/// Default ceiling on generated tokens per summary.
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// One summarisation exchange with the gateway.
#[async_trait]
pub trait SummaryGateway: Send + Sync {
    /// Short label for logs ("governor", "provider:anthropic", …).
    fn name(&self) -> &str;

    /// Send a single request and wait for the answer. No local deadline.
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, GatewayError>;
}

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    pub model: String,
    pub system: String,
    pub max_tokens: usize,
    pub messages: Vec<Message>,
    /// Attribution for the gateway's cost accounting. Not interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_run_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }
}

/// A piece of a message: plain text, or an attached document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    /// `data` is the base64 encoding of the raw document bytes.
    Document {
        name: String,
        format: String,
        data: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Attach raw bytes as a named document block.
    pub fn document(name: impl Into<String>, format: impl Into<String>, bytes: &[u8]) -> Self {
        ContentBlock::Document {
            name: name.into(),
            format: format.into(),
            data: STANDARD.encode(bytes),
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl InvokeResponse {
    /// A response carrying a single text block. Handy for gateways and stubs.
    pub fn from_text(text: impl Into<String>, usage: Usage) -> Self {
        Self {
            content: vec![ResponseBlock::Text { text: text.into() }],
            usage,
            model: None,
            stop_reason: None,
        }
    }

    /// Concatenated text of every text block, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Token usage and the gateway's cost estimate for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub estimated_cost_usd: f64,
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Pick the gateway for this run, from most-specific to least-specific.
///
/// 1. **Pre-built gateway** (`config.gateway`): used as-is.
/// 2. **Governor endpoint** (`config.governor_endpoint`, from
///    `LLM_GOVERNOR_FUNCTION`): the production path.
/// 3. **Named provider** (`config.provider_name`): direct provider access
///    through `edgequake-llm`, reading its API key from the environment.
pub fn resolve_gateway(config: &SummarizerConfig) -> Result<Arc<dyn SummaryGateway>, SummarizerError> {
    if let Some(ref gateway) = config.gateway {
        return Ok(Arc::clone(gateway));
    }

    if let Some(ref endpoint) = config.governor_endpoint {
        debug!("Using governor gateway at {}", endpoint);
        return Ok(Arc::new(governor::GovernorGateway::new(endpoint)?));
    }

    if let Some(ref name) = config.provider_name {
        debug!("Using provider gateway '{}' with model {}", name, config.model);
        return Ok(Arc::new(provider::ProviderGateway::from_name(name, &config.model)?));
    }

    Err(SummarizerError::GatewayNotConfigured {
        hint: format!(
            "{} is not set.\nSet it to the governor endpoint URL, or pass --provider to call a provider directly.",
            crate::config::GOVERNOR_ENV
        ),
    })
}
