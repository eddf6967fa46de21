//! Post-processing: deterministic cleanup of the gateway's summary text.
//!
//! The system prompt asks for plain paragraphs, but models still slip in
//! Markdown now and then (a `## Overview` heading, `**bold**` field names, a
//! fenced block around the whole answer). The report is laid out as plain
//! text in a base-14 PDF font, so those markers would show up literally and
//! anything outside the font's character set would come out as garbage.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw answer; the character-set mapping runs after Markdown
//! stripping so typographic quotes inside `**…**` are still caught; blank
//! lines are collapsed last because every earlier rule can create them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw summary text.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence wrapping the whole answer
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Strip Markdown heading markers
/// 5. Strip `**bold**`, `__bold__` and `` `code` `` markers, keeping the text
/// 6. Map typography to the base-14 font character set
/// 7. Trim trailing whitespace per line
/// 8. Collapse runs of blank lines to a single blank line
/// 9. Trim leading/trailing blank space
pub fn clean_summary(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = strip_heading_markers(&s);
    let s = strip_emphasis(&s);
    let s = to_base14_charset(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Strip heading markers ────────────────────────────────────────────

// Heading text never starts lowercase; `# of records: 5` is a count, not a heading.
static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+([^\sa-z])").unwrap());

fn strip_heading_markers(input: &str) -> String {
    RE_HEADING.replace_all(input, "$1").to_string()
}

// ── Rule 5: Strip emphasis and inline code ───────────────────────────────────

static RE_BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static RE_BOLD_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\s)__([^_\n]+)__").unwrap());
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

fn strip_emphasis(input: &str) -> String {
    let s = RE_BOLD_STARS.replace_all(input, "$1");
    // Only at word starts: `__init__`-style identifiers inside words survive.
    let s = RE_BOLD_UNDERSCORES.replace_all(&s, "$1$2");
    RE_INLINE_CODE.replace_all(&s, "$1").to_string()
}

// ── Rule 6: Map to the base-14 character set ─────────────────────────────────

/// Map text onto printable ASCII so a base-14 font can draw every glyph.
///
/// Common typography (curly quotes, dashes, bullets, ellipsis, non-breaking
/// spaces) gets an ASCII look-alike; anything else becomes `?`. Newlines are
/// kept, tabs become a space.
pub fn to_base14_charset(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            ' '..='~' => out.push(c),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => {
                out.push('-')
            }
            '\u{2022}' | '\u{25CF}' | '\u{00B7}' | '\u{25E6}' => out.push('-'),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' | '\u{2007}' => out.push(' '),
            '\u{2026}' => out.push_str("..."),
            '\u{00D7}' => out.push('x'),
            '\u{2264}' => out.push_str("<="),
            '\u{2265}' => out.push_str(">="),
            '\u{2192}' => out.push_str("->"),
            _ => out.push('?'),
        }
    }
    out
}

// ── Rule 7: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 8: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}
