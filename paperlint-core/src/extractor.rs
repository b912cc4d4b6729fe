// Structural extractor
//
// RawDocument (from a PdfBackend) → ordered, classified Elements plus the
// document-level ParseReport. Fatal problems (undecodable or encrypted input)
// come back as ParseErrors with no elements; nothing here panics or returns Err.

use crate::classifier::classify_line;
use crate::error::{BackendError, SourceError};
use crate::preprocessors::raw::{RawBlock, RawDocument, RawPage};
use crate::preprocessors::{PdfBackend, PdfSource};
use crate::types::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Body font size assumed when a page has no sized text
pub const DEFAULT_BODY_FONT: f32 = 10.0;

/// Pages with less trimmed text than this are counted as scanned
pub const SCANNED_TEXT_THRESHOLD: usize = 10;

/// Column split position as a fraction of page width
const COLUMN_SPLIT_RATIO: f32 = 0.5;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+(?:[,，\-–]\s*\d+)*\]").unwrap());

/// Detect the source kind, decode it with `backend` and extract elements.
pub fn extract_content(backend: &dyn PdfBackend, content: &str) -> Extraction {
    match PdfSource::detect(content) {
        Ok(source) => extract(backend, &source),
        Err(e) => invalid_source(e),
    }
}

/// Decode `source` with `backend` and extract elements.
pub fn extract(backend: &dyn PdfBackend, source: &PdfSource) -> Extraction {
    let bytes = match source.read_bytes() {
        Ok(bytes) => bytes,
        Err(e) => return invalid_source(e),
    };

    match backend.open(&bytes) {
        Ok(document) => extract_document(&document),
        Err(BackendError::Encrypted) => {
            warn!(backend = backend.name(), "document is encrypted, extraction stopped");
            Extraction {
                elements: Vec::new(),
                parse_errors: vec![ParseError::new(
                    parse_error_types::ENCRYPTED_PDF,
                    "document is encrypted",
                )],
                parse_report: ParseReport {
                    encrypted: true,
                    ..ParseReport::default()
                },
            }
        }
        Err(BackendError::Invalid(message)) => {
            warn!(backend = backend.name(), %message, "backend could not decode document");
            fatal(parse_error_types::INVALID_PDF, message)
        }
    }
}

fn invalid_source(error: SourceError) -> Extraction {
    warn!(error = %error, "unrecognized document source");
    fatal(parse_error_types::INVALID_PDF, error.to_string())
}

fn fatal(error_type: &str, message: impl Into<String>) -> Extraction {
    Extraction {
        parse_errors: vec![ParseError::new(error_type, message)],
        ..Extraction::default()
    }
}

/// Walk a decoded document page by page, threading the reference-section
/// state through every line.
pub fn extract_document(document: &RawDocument) -> Extraction {
    let mut extraction = Extraction::default();
    let mut reference_mode = false;

    for page in &document.pages {
        if let Some(message) = &page.error {
            extraction.parse_errors.push(ParseError::on_page(
                parse_error_types::PAGE_PARSE_FAILED,
                message.clone(),
                page.number.max(1),
            ));
            continue;
        }
        reference_mode = extract_page(page, reference_mode, &mut extraction);
    }

    info!(
        pages = document.pages.len(),
        elements = extraction.elements.len(),
        scanned = extraction.parse_report.scanned_pages,
        multi_column = extraction.parse_report.multi_column_pages,
        "structural extraction finished"
    );
    extraction
}

/// Returns the reference-section state after the page's last line.
fn extract_page(page: &RawPage, mut reference_mode: bool, out: &mut Extraction) -> bool {
    let page_num = page.number.max(1);

    if page.plain_text().trim().chars().count() < SCANNED_TEXT_THRESHOLD {
        out.parse_report.scanned_pages += 1;
    }

    if page.text_blocks().next().is_none() {
        out.elements.push(Element::image(normalized(page.full_bbox()), page_num));
        return reference_mode;
    }

    let body_font = body_font_size(page);
    let (ordered, multi_column) = reading_order(page);
    if multi_column {
        out.parse_report.multi_column_pages += 1;
    }
    debug!(page = page_num, body_font, multi_column, "extracting page");

    for block in ordered {
        let lines = match block {
            RawBlock::Image { bbox } => {
                out.elements.push(Element::image(normalized(*bbox), page_num));
                continue;
            }
            RawBlock::Text { lines, .. } => lines,
        };

        for line in lines {
            let text = line.text();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let font_size = line.max_font_size().unwrap_or(body_font);
            let (region, mode) = classify_line(text, font_size, body_font, reference_mode);
            reference_mode = mode;

            let bbox = normalized(line.bbox);
            out.elements
                .push(Element::new(region.line_kind(), text, bbox, page_num, region));

            if !reference_mode {
                for marker in CITATION_MARKER.find_iter(text) {
                    out.elements.push(Element::new(
                        ElementKind::Citation,
                        marker.as_str(),
                        bbox,
                        page_num,
                        Region::Citation,
                    ));
                }
            }
        }
    }

    reference_mode
}

/// Median font size over every text span on the page.
pub fn body_font_size(page: &RawPage) -> f32 {
    let mut sizes: Vec<f32> = page
        .blocks
        .iter()
        .filter_map(|b| match b {
            RawBlock::Text { lines, .. } => Some(lines),
            RawBlock::Image { .. } => None,
        })
        .flatten()
        .flat_map(|l| l.spans.iter().map(|s| s.font_size))
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();

    if sizes.is_empty() {
        return DEFAULT_BODY_FONT;
    }
    sizes.sort_by(f32::total_cmp);
    let mid = sizes.len() / 2;
    if sizes.len() % 2 == 0 {
        (sizes[mid - 1] + sizes[mid]) / 2.0
    } else {
        sizes[mid]
    }
}

/// Blocks in reading order: the left column group, then the right one.
/// A page is multi-column only when text blocks start on both sides of the midline.
fn reading_order(page: &RawPage) -> (Vec<&RawBlock>, bool) {
    let mid = page.width * COLUMN_SPLIT_RATIO;
    let is_left = |b: &RawBlock| b.bbox().x0 < mid;

    let left_text = page.text_blocks().any(is_left);
    let right_text = page.text_blocks().any(|b| !is_left(b));
    if !(left_text && right_text) {
        return (page.blocks.iter().collect(), false);
    }

    let (left, right): (Vec<&RawBlock>, Vec<&RawBlock>) = page.blocks.iter().partition(|b| is_left(b));
    (left.into_iter().chain(right).collect(), true)
}

fn normalized(bbox: BoundingBox) -> BoundingBox {
    BoundingBox::new(bbox.x0, bbox.y0, bbox.x1, bbox.y1)
}
