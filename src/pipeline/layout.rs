//! Report layout: place the title, metadata line, separator and wrapped body
//! text onto A4 pages.
//!
//! Layout is a pure function of its inputs (title, body, timestamp) and
//! produces a [`ReportLayout`]: pages of positioned text lines and rules, in
//! millimetres measured from the top-left corner. [`crate::pipeline::render`]
//! turns it into PDF objects. Keeping the two apart lets tests check what the
//! report says and where, without parsing a PDF.
//!
//! ## Geometry
//!
//! ```text
//!  10mm ┌──────────────────────────────────────────┐
//!       │ Dataset Summary: patients      18pt bold │ 12mm cell, +4mm
//!       │ Generated 2026-01-05 14:03 UTC by …  9pt │  5mm cell, +6mm
//!       │ ──────────────────────────────────────── │ rule,      +6mm
//!       │ Body text, 11pt, 6mm lines, wrapped to   │
//!       │ 188mm (190mm box minus 1mm padding each  │
//!       │ side) …                                  │
//!  277mm└─ page break ─────────────────────────────┘ (20mm bottom margin)
//! ```

use chrono::{DateTime, Utc};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 20.0;
/// Horizontal padding inside a text cell.
pub const CELL_PADDING_MM: f32 = 1.0;

pub const TITLE_SIZE_PT: f32 = 18.0;
pub const META_SIZE_PT: f32 = 9.0;
pub const BODY_SIZE_PT: f32 = 11.0;

const TITLE_CELL_MM: f32 = 12.0;
const META_CELL_MM: f32 = 5.0;
const BODY_LINE_MM: f32 = 6.0;

const META_GRAY: u8 = 128;
const RULE_GRAY: u8 = 200;

/// Attribution printed on the metadata line.
pub const ATTRIBUTION: &str = "LLM Summarizer";

const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
}

/// One line of text. `baseline_mm` is measured from the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font: FontFace,
    pub size_pt: f32,
    /// 0 = black, 255 = white.
    pub gray: u8,
    pub x_mm: f32,
    pub baseline_mm: f32,
}

/// A horizontal rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1_mm: f32,
    pub x2_mm: f32,
    pub y_mm: f32,
    pub gray: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    Text(TextLine),
    Rule(Rule),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<LayoutItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<PageLayout>,
}

impl ReportLayout {
    /// All text lines, page by page, in drawing order.
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.pages.iter().flat_map(|p| {
            p.items.iter().filter_map(|item| match item {
                LayoutItem::Text(t) => Some(t),
                LayoutItem::Rule(_) => None,
            })
        })
    }

    /// The visible text of the report, one line per text item.
    pub fn plain_text(&self) -> String {
        self.lines()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub fn title_line(title: &str) -> String {
    format!("Dataset Summary: {title}")
}

pub fn metadata_line(generated_at: DateTime<Utc>) -> String {
    format!(
        "Generated {} by {ATTRIBUTION}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Lay out a full report. `title` and `body` must already be in the base-14
/// character set (see [`crate::pipeline::postprocess::to_base14_charset`]).
pub fn layout_report(title: &str, body: &str, generated_at: DateTime<Utc>) -> ReportLayout {
    let mut cursor = Cursor::new();
    let text_x = MARGIN_MM + CELL_PADDING_MM;

    cursor.cell(
        title_line(title),
        FontFace::HelveticaBold,
        TITLE_SIZE_PT,
        0,
        TITLE_CELL_MM,
    );
    cursor.y += 4.0;

    cursor.cell(
        metadata_line(generated_at),
        FontFace::Helvetica,
        META_SIZE_PT,
        META_GRAY,
        META_CELL_MM,
    );
    cursor.y += 6.0;

    let rule_y = cursor.y;
    cursor.current().items.push(LayoutItem::Rule(Rule {
        x1_mm: MARGIN_MM,
        x2_mm: PAGE_WIDTH_MM - MARGIN_MM,
        y_mm: rule_y,
        gray: RULE_GRAY,
    }));
    cursor.y += 6.0;

    let box_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let wrap_width = box_width - 2.0 * CELL_PADDING_MM;
    for line in wrap_text(body, wrap_width, BODY_SIZE_PT) {
        cursor.break_if_needed(BODY_LINE_MM);
        let baseline = baseline_in_cell(cursor.y, BODY_LINE_MM, BODY_SIZE_PT);
        if !line.is_empty() {
            cursor.current().items.push(LayoutItem::Text(TextLine {
                text: line,
                font: FontFace::Helvetica,
                size_pt: BODY_SIZE_PT,
                gray: 0,
                x_mm: text_x,
                baseline_mm: baseline,
            }));
        }
        cursor.y += BODY_LINE_MM;
    }

    ReportLayout {
        pages: cursor.pages,
    }
}

/// Vertical position state while filling pages.
struct Cursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: MARGIN_MM,
        }
    }

    fn current(&mut self) -> &mut PageLayout {
        // `pages` starts non-empty and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn break_if_needed(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.pages.push(PageLayout::default());
            self.y = MARGIN_MM;
        }
    }

    /// A single-line cell spanning the text width; advances `y` by `height`.
    fn cell(&mut self, text: String, font: FontFace, size_pt: f32, gray: u8, height: f32) {
        self.break_if_needed(height);
        let baseline = baseline_in_cell(self.y, height, size_pt);
        self.current().items.push(LayoutItem::Text(TextLine {
            text,
            font,
            size_pt,
            gray,
            x_mm: MARGIN_MM + CELL_PADDING_MM,
            baseline_mm: baseline,
        }));
        self.y += height;
    }
}

/// Vertically centre a line of `size_pt` text in a cell starting at `top`.
fn baseline_in_cell(top: f32, height: f32, size_pt: f32) -> f32 {
    top + 0.5 * height + 0.3 * size_pt * MM_PER_PT
}

// ── Wrapping ─────────────────────────────────────────────────────────────

/// Greedy word wrap to `width_mm` using Helvetica metrics.
///
/// Explicit newlines always break; an empty paragraph yields an empty line
/// (a blank line in the report). Words wider than the box are split by
/// character.
pub fn wrap_text(text: &str, width_mm: f32, size_pt: f32) -> Vec<String> {
    let space = text_width_mm(" ", size_pt);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0.0_f32;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_width = text_width_mm(word, size_pt);

            if !line.is_empty() && line_width + space + word_width <= width_mm {
                line.push(' ');
                line.push_str(word);
                line_width += space + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
            }

            if word_width <= width_mm {
                line.push_str(word);
                line_width = word_width;
            } else {
                for c in word.chars() {
                    let w = char_width_mm(c, size_pt);
                    if !line.is_empty() && line_width + w > width_mm {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0.0;
                    }
                    line.push(c);
                    line_width += w;
                }
            }
        }

        lines.push(line);
    }

    lines
}

/// Rendered width of `text` in Helvetica at `size_pt`.
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().map(|c| char_width_mm(c, size_pt)).sum()
}

fn char_width_mm(c: char, size_pt: f32) -> f32 {
    let units = match c {
        ' '..='~' => HELVETICA_WIDTHS[(c as usize) - 0x20],
        _ => 556,
    };
    f32::from(units) / 1000.0 * size_pt * MM_PER_PT
}

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E, from the AFM.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];
