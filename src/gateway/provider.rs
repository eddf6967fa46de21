//! Direct provider access through `edgequake-llm`.
//!
//! Used when no governor endpoint is deployed (local runs, demos). There is
//! no budget or allow-list here, and chat providers have no document block,
//! so attached documents are flattened into the user text.

use super::{ContentBlock, InvokeRequest, InvokeResponse, Role, SummaryGateway, Usage};
use crate::error::{GatewayError, SummarizerError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Haiku list price per million input tokens, USD.
const HAIKU_INPUT_USD_PER_MTOK: f64 = 1.0;
/// Haiku list price per million output tokens, USD.
const HAIKU_OUTPUT_USD_PER_MTOK: f64 = 5.0;

pub struct ProviderGateway {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Instantiate a named provider (`anthropic`, `openai`, …) for `model`.
    /// The provider reads its API key from the environment.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, SummarizerError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            SummarizerError::GatewayNotConfigured {
                hint: format!("provider '{provider_name}' could not be created: {e}"),
            }
        })?;
        Ok(Self::new(provider, format!("provider:{provider_name}")))
    }
}

#[async_trait]
impl SummaryGateway for ProviderGateway {
    fn name(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, GatewayError> {
        let mut messages = vec![ChatMessage::system(request.system.as_str())];
        for message in &request.messages {
            let text = flatten_blocks(&message.content);
            messages.push(match message.role {
                Role::User => ChatMessage::user(text.as_str()),
                Role::Assistant => ChatMessage::assistant(text.as_str()),
            });
        }

        let options = CompletionOptions {
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| GatewayError::Api {
                code: self.label.clone(),
                message: e.to_string(),
            })?;

        let input_tokens = response.prompt_tokens as u64;
        let output_tokens = response.completion_tokens as u64;
        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, input_tokens, output_tokens
        );

        Ok(InvokeResponse::from_text(
            response.content,
            Usage {
                input_tokens,
                output_tokens,
                estimated_cost_usd: estimate_cost_usd(input_tokens, output_tokens),
            },
        ))
    }
}

/// Render content blocks as one text turn. Documents are decoded and framed
/// with their name so the instruction text can still refer to "the attached
/// document".
fn flatten_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Document { name, format, data } => {
                let body = STANDARD
                    .decode(data)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_else(|_| data.clone());
                format!("Attached document '{name}.{format}':\n\n{body}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn estimate_cost_usd(input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 * HAIKU_INPUT_USD_PER_MTOK
        + output_tokens as f64 * HAIKU_OUTPUT_USD_PER_MTOK)
        / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_are_decoded_into_text() {
        let blocks = vec![
            ContentBlock::document("patients", "txt", br#"{"records":2}"#),
            ContentBlock::text("Summarise it."),
        ];
        let text = flatten_blocks(&blocks);
        assert_eq!(
            text,
            "Attached document 'patients.txt':\n\n{\"records\":2}\n\nSummarise it."
        );
    }

    #[test]
    fn cost_estimate_uses_haiku_prices() {
        let cost = estimate_cost_usd(1_000_000, 200_000);
        assert!((cost - 2.0).abs() < 1e-9, "got {cost}");
        assert_eq!(estimate_cost_usd(0, 0), 0.0);
    }
}
