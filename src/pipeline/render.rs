//! Report rendering: turn a [`ReportLayout`] into PDF bytes with printpdf and
//! write them to disk.
//!
//! ## spawn_blocking
//!
//! Building the PDF object tree and serialising its content streams is
//! CPU-bound, and the final write is blocking file I/O. Both run on the
//! blocking pool so Tokio worker threads are not stalled.
//!
//! ## Atomic write
//!
//! The bytes go to a temporary file in the target directory, which is then
//! persisted over `{base}-summary.pdf`. A reader never sees a half-written
//! report, and a rerun replaces the old report in one step.

use crate::error::SummarizerError;
use crate::pipeline::layout::{
    layout_report, FontFace, LayoutItem, ReportLayout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const LAYER_NAME: &str = "Layer 1";
const RULE_THICKNESS_PT: f32 = 0.567;

/// Lay out and write the report for one document, stamped with the current
/// time. Returns the layout that was drawn.
pub async fn render_report(
    path: &Path,
    title: &str,
    body: &str,
) -> Result<ReportLayout, SummarizerError> {
    render_report_at(path, title, body, Utc::now()).await
}

/// [`render_report`] with an explicit timestamp.
pub async fn render_report_at(
    path: &Path,
    title: &str,
    body: &str,
    generated_at: DateTime<Utc>,
) -> Result<ReportLayout, SummarizerError> {
    let layout = layout_report(title, body, generated_at);
    let doc_title = crate::pipeline::layout::title_line(title);
    let target = path.to_path_buf();
    let drawn = layout.clone();

    tokio::task::spawn_blocking(move || {
        let bytes = to_pdf_bytes(&drawn, &doc_title).map_err(|detail| {
            SummarizerError::RenderFailed {
                path: target.clone(),
                detail,
            }
        })?;
        write_atomic(&target, &bytes)?;
        debug!("Wrote {} ({} bytes)", target.display(), bytes.len());
        Ok::<_, SummarizerError>(())
    })
    .await
    .map_err(|e| SummarizerError::Internal(format!("Render task panicked: {}", e)))??;

    Ok(layout)
}

/// Serialise a layout as a PDF document using the Helvetica base-14 fonts.
pub fn to_pdf_bytes(layout: &ReportLayout, doc_title: &str) -> Result<Vec<u8>, String> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        doc_title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        LAYER_NAME,
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| format!("{:?}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| format!("{:?}", e))?;

    for (i, page) in layout.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
            doc.get_page(p).get_layer(l)
        };

        for item in &page.items {
            match item {
                LayoutItem::Text(line) => {
                    let font = match line.font {
                        FontFace::Helvetica => &regular,
                        FontFace::HelveticaBold => &bold,
                    };
                    draw_text(&layer, font, line);
                }
                LayoutItem::Rule(rule) => {
                    layer.set_outline_color(gray(rule.gray));
                    layer.set_outline_thickness(RULE_THICKNESS_PT);
                    let y = Mm(PAGE_HEIGHT_MM - rule.y_mm);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(rule.x1_mm), y), false),
                            (Point::new(Mm(rule.x2_mm), y), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    doc.save_to_bytes().map_err(|e| format!("{:?}", e))
}

fn draw_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    line: &crate::pipeline::layout::TextLine,
) {
    layer.set_fill_color(gray(line.gray));
    layer.use_text(
        line.text.as_str(),
        line.size_pt,
        Mm(line.x_mm),
        Mm(PAGE_HEIGHT_MM - line.baseline_mm),
        font,
    );
}

fn gray(level: u8) -> Color {
    let v = f32::from(level) / 255.0;
    Color::Rgb(Rgb::new(v, v, v, None))
}

/// Write `bytes` to `path` through a sibling temp file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SummarizerError> {
    let write_failed = |source| SummarizerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn pdf_bytes_have_header() {
        let layout = layout_report("patients", "A short summary.", at());
        let bytes = to_pdf_bytes(&layout, "Dataset Summary: patients").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_text_matches_layout() {
        let layout = layout_report("patients", "A short summary.", at());
        let bytes = to_pdf_bytes(&layout, "Dataset Summary: patients").unwrap();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Dataset Summary: patients"), "got: {text}");
        assert!(
            text.contains("Generated 2026-03-01 09:30 UTC by LLM Summarizer"),
            "got: {text}"
        );
        assert!(text.contains("A short summary."), "got: {text}");
    }

    #[tokio::test]
    async fn writes_report_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patients-summary.pdf");
        let layout = render_report_at(&path, "patients", "Summary body.", at())
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(layout.page_count(), 1);
        assert!(layout.plain_text().contains("Summary body."));
    }

    #[tokio::test]
    async fn rerun_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a-summary.pdf");
        std::fs::write(&path, b"stale").unwrap();

        render_report_at(&path, "a", "First.", at()).await.unwrap();
        render_report_at(&path, "a", "Second.", at()).await.unwrap();

        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn missing_parent_is_write_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent").join("x-summary.pdf");
        let err = render_report_at(&path, "x", "body", at()).await.unwrap_err();
        assert!(matches!(err, SummarizerError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn multi_page_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big-summary.pdf");
        let body = "Lorem ipsum dolor sit amet. ".repeat(600);
        let layout = render_report_at(&path, "big", &body, at()).await.unwrap();
        assert!(layout.page_count() > 1);
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }
}
