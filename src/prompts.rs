//! Prompts sent to the LLM gateway for dataset summarisation.
//!
//! Every prompt lives here so changing the wording touches exactly one file,
//! and so unit tests can inspect the prompts without a gateway.

/// System instruction for every summarisation request.
///
/// The report renderer lays the answer out as plain paragraphs, so the model
/// is asked explicitly not to answer in Markdown.
pub const SYSTEM_PROMPT: &str = "You are a data analyst. Summarize datasets clearly and concisely. \
Use plain text paragraphs, not markdown.";

/// The four-part outline every summary should follow.
const SUMMARY_OUTLINE: &str = r#"1. Overview: What this dataset contains and its purpose
2. Structure: The key fields and their types
3. Content Summary: A description of the data values and any patterns
4. Potential Uses: What this dataset could be used for"#;

/// User instruction sent next to an attached document block.
pub fn attached_document_prompt() -> String {
    format!(
        "The attached JSON document represents a dataset. Please provide a comprehensive \
summary that includes:\n\n{SUMMARY_OUTLINE}"
    )
}

/// User instruction with the pretty-printed JSON embedded in the text.
pub fn inline_document_prompt(pretty_json: &str) -> String {
    format!(
        "The following JSON document represents a dataset. Please provide a comprehensive \
summary that includes:\n\n{SUMMARY_OUTLINE}\n\nJSON document:\n\n{pretty_json}"
    )
}
