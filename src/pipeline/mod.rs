//! Pipeline stages for JSON-to-summary-report processing.
//!
//! Each submodule implements exactly one step. The orchestration (ordering,
//! logging, progress events) lives in [`crate::run`].
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ load ──▶ llm ──▶ postprocess ──▶ layout ──▶ render
//! (*.json)    (parse)  (gateway) (cleanup)      (A4 pages)  (printpdf)
//! ```
//!
//! 1. [`discover`]: list `*.json` files of the input directory
//! 2. [`load`]: read a file and check it is well-formed JSON
//! 3. [`llm`]: build the summarisation request and call the gateway;
//!    the only stage with network I/O
//! 4. [`postprocess`]: strip Markdown the model slipped in and map the
//!    text onto the PDF font's character set
//! 5. [`layout`]: place title, metadata, rule and wrapped body on pages
//! 6. [`render`]: write the layout as a PDF; runs in `spawn_blocking`

pub mod discover;
pub mod layout;
pub mod llm;
pub mod load;
pub mod postprocess;
pub mod render;
