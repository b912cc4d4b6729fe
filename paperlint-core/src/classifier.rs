// Zone classifier
//
// Maps one text line (plus the running reference-section flag) to a semantic
// region. Rule order matters: reference mode overrides everything, and caption
// detection runs before the font-size heading rule so large captions never
// become titles.

use crate::types::Region;
use regex::Regex;
use std::sync::LazyLock;

/// A line at least this many times the body font size is a heading
pub const HEADING_FONT_RATIO: f32 = 1.3;

static CAPTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(图|表)\s*\d+").unwrap());

static FORMULA_GLYPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[=∑∫√≈≠≤≥]").unwrap());

static FORMULA_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(（\d+）|\(\d+\))$").unwrap());

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)[.\s、]").unwrap());

static CHAPTER_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^第[一二三四五六七八九十百]+[章节]").unwrap());

static BRACKET_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+(?:,\s*\d+)*\]").unwrap());

pub fn is_reference_title(text: &str) -> bool {
    matches!(text.trim(), "参考文献" | "参考文献：")
}

pub fn is_caption(text: &str) -> bool {
    CAPTION.is_match(text.trim_start())
}

/// Operator glyphs anywhere, or a trailing parenthesized number
pub fn is_formula_text(text: &str) -> bool {
    FORMULA_GLYPH.is_match(text) || FORMULA_NUMBER.is_match(text.trim_end())
}

pub fn is_heading_text(text: &str) -> bool {
    let text = text.trim_start();
    NUMBERED_HEADING.is_match(text) || CHAPTER_HEADING.is_match(text)
}

pub fn has_bracket_citation(text: &str) -> bool {
    BRACKET_CITATION.is_match(text)
}

/// Region for a line, given the document state before it.
pub fn classify(text: &str, font_size: f32, body_font: f32, reference_mode: bool) -> Region {
    if reference_mode {
        Region::Reference
    } else if is_caption(text) {
        Region::Chart
    } else if is_formula_text(text) {
        Region::Formula
    } else if is_heading_text(text) || font_size >= body_font * HEADING_FONT_RATIO {
        Region::Title
    } else if has_bracket_citation(text) {
        Region::Citation
    } else {
        Region::Main
    }
}

/// Classify a line and advance the reference-section state.
///
/// The state flips on the reference-list heading itself, so that heading is
/// already classified as `reference`. Once set it is never cleared.
pub fn classify_line(text: &str, font_size: f32, body_font: f32, reference_mode: bool) -> (Region, bool) {
    let reference_mode = reference_mode || is_reference_title(text);
    (classify(text, font_size, body_font, reference_mode), reference_mode)
}
