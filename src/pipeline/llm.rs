//! Summarisation client: shape the gateway request for one document and read
//! the answer back.
//!
//! All prompt wording lives in [`crate::prompts`]. Nothing here retries; a
//! gateway failure is wrapped with the file name and returned as fatal.

use crate::config::{DocumentPresentation, SummarizerConfig};
use crate::error::SummarizerError;
use crate::gateway::{ContentBlock, InvokeRequest, Message, SummaryGateway, Usage};
use crate::pipeline::load::LoadedDocument;
use crate::prompts::{attached_document_prompt, inline_document_prompt, SYSTEM_PROMPT};
use tracing::{debug, warn};

/// Format label on attached document blocks. JSON is sent as plain text.
pub const DOCUMENT_FORMAT: &str = "txt";

/// The gateway's answer for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    pub usage: Usage,
}

/// Build the single-turn request for `doc`.
///
/// ## Message Layout
///
/// * **Attached**: one user turn: the raw bytes as a document block named
///   after the file, followed by the outline instruction.
/// * **Inline**: one user turn: the outline instruction with the
///   pretty-printed JSON appended.
pub fn build_request(doc: &LoadedDocument, config: &SummarizerConfig) -> InvokeRequest {
    let content = match config.presentation {
        DocumentPresentation::Attached => vec![
            ContentBlock::document(doc.name.as_str(), DOCUMENT_FORMAT, &doc.bytes),
            ContentBlock::text(attached_document_prompt()),
        ],
        DocumentPresentation::Inline => vec![ContentBlock::text(inline_document_prompt(&doc.pretty()))],
    };

    InvokeRequest {
        model: config.model.clone(),
        system: SYSTEM_PROMPT.to_string(),
        max_tokens: config.max_tokens,
        messages: vec![Message::user(content)],
        execution_run_id: config.execution_run_id.clone(),
    }
}

/// Ask the gateway for a summary of `doc`.
pub async fn summarize(
    gateway: &dyn SummaryGateway,
    doc: &LoadedDocument,
    config: &SummarizerConfig,
) -> Result<Summary, SummarizerError> {
    let request = build_request(doc, config);
    debug!(
        "Invoking {} for {} ({:?}, max {} tokens)",
        gateway.name(),
        doc.file_name(),
        config.presentation,
        request.max_tokens
    );

    let response = gateway
        .invoke(&request)
        .await
        .map_err(|source| SummarizerError::Gateway {
            file: doc.file_name(),
            source,
        })?;

    let text = response.text();
    if text.trim().is_empty() {
        warn!("{}: gateway returned an empty summary", doc.file_name());
    }

    Ok(Summary {
        text,
        usage: response.usage,
    })
}
