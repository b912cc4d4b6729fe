//! lopdf-based PDF decoding backend.
//!
//! Interprets each page's content stream just far enough to recover
//! positioned text runs (with font size) and image placements, then groups
//! runs into lines and lines into blocks.

use super::PdfBackend;
use crate::error::BackendError;
use crate::preprocessors::pdf::cmap::ToUnicodeMap;
use crate::preprocessors::raw::{RawBlock, RawDocument, RawLine, RawPage, RawSpan};
use crate::types::BoundingBox;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// US Letter, used when a page has no usable MediaBox
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// TJ adjustments beyond this (thousandths of an em) are treated as word gaps
const TJ_SPACE_THRESHOLD: f32 = 250.0;

pub struct LopdfBackend;

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn open(&self, pdf_bytes: &[u8]) -> Result<RawDocument, BackendError> {
        let marked_encrypted = trailer_declares_encryption(pdf_bytes);

        let doc = match Document::load_mem(pdf_bytes) {
            Ok(doc) => doc,
            Err(_) if marked_encrypted => return Err(BackendError::Encrypted),
            Err(e) => return Err(BackendError::Invalid(e.to_string())),
        };

        if marked_encrypted || doc.trailer.get(b"Encrypt").is_ok() {
            return Err(BackendError::Encrypted);
        }

        let mut pages = Vec::new();
        for (number, page_id) in doc.get_pages() {
            let (origin_x, origin_y, width, height) = page_geometry(&doc, page_id);
            let mut page = RawPage::new(number, width, height);

            match interpret_page(&doc, page_id) {
                Ok(events) => {
                    let events = events
                        .into_iter()
                        .map(|e| e.shifted(origin_x, origin_y, height))
                        .collect();
                    page.blocks = group_blocks(events);
                }
                Err(message) => {
                    warn!(page = number, %message, "failed to interpret page content");
                    page.error = Some(message);
                }
            }
            debug!(page = number, blocks = page.blocks.len(), "decoded page");
            pages.push(page);
        }

        Ok(RawDocument { pages })
    }

    fn name(&self) -> &str {
        "lopdf"
    }
}

/// Pre-load encryption check for files lopdf refuses to open.
///
/// Only the newest cross-reference section is inspected: the bytes from the
/// offset named by the last `startxref` up to that keyword (classic table
/// plus trailer), cut at `stream` for an xref stream dictionary. Page text
/// that merely mentions `/Encrypt` is never part of that region.
fn trailer_declares_encryption(bytes: &[u8]) -> bool {
    last_xref_section(bytes).is_some_and(|section| find(section, b"/Encrypt").is_some())
}

fn last_xref_section(bytes: &[u8]) -> Option<&[u8]> {
    let keyword = rfind(bytes, b"startxref")?;
    let digits: String = bytes[keyword + b"startxref".len()..]
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| char::from(b))
        .collect();
    let offset: usize = digits.parse().ok()?;

    let section = bytes.get(offset..keyword)?;
    let end = find(section, b"stream").unwrap_or(section.len());
    Some(&section[..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

// ===== DOCUMENT HELPERS =====

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f as f32),
        _ => None,
    }
}

/// Look up a page attribute, walking up the page tree via /Parent
fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // Bounded walk guards against cyclic /Parent links
    for _ in 0..32 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// (origin_x, origin_y, width, height) of the page's MediaBox
fn page_geometry(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let media_box = resolve_inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| resolve(doc, o).and_then(object_to_f32))
                .collect();
            <[f32; 4]>::try_from(values).ok()
        })
        .unwrap_or(DEFAULT_MEDIA_BOX);

    let [x0, y0, x1, y1] = media_box;
    (x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
}

fn sub_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key)
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
}

fn stream_bytes(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

// ===== FONT DECODING =====

#[derive(Debug, Clone, Default)]
struct FontDecoder {
    to_unicode: Option<ToUnicodeMap>,
    /// Type0 fonts use two-byte codes
    two_byte: bool,
}

impl FontDecoder {
    fn load(doc: &Document, font: &Dictionary) -> Self {
        let two_byte = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|name| name == b"Type0");

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(stream_bytes)
            .map(|bytes| ToUnicodeMap::parse(&String::from_utf8_lossy(&bytes)))
            .filter(|map| !map.is_empty());

        Self { to_unicode, two_byte }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(map) = &self.to_unicode {
            return map.decode(bytes);
        }
        if bytes.starts_with(&[0xFE, 0xFF]) {
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            return String::from_utf16_lossy(&units);
        }
        if self.two_byte {
            // CIDs without a ToUnicode map are glyph ids, not characters
            return String::new();
        }
        bytes.iter().map(|b| char::from(*b)).collect()
    }
}

fn load_fonts(doc: &Document, resources: Option<&Dictionary>) -> HashMap<Vec<u8>, FontDecoder> {
    let mut fonts = HashMap::new();
    let Some(font_dict) = resources.and_then(|r| sub_dict(doc, r, b"Font")) else {
        return fonts;
    };
    for (name, obj) in font_dict.iter() {
        if let Some(font) = resolve(doc, obj).and_then(|o| o.as_dict().ok()) {
            fonts.insert(name.clone(), FontDecoder::load(doc, font));
        }
    }
    fonts
}

fn image_xobjects(doc: &Document, resources: Option<&Dictionary>) -> Vec<Vec<u8>> {
    let Some(xobjects) = resources.and_then(|r| sub_dict(doc, r, b"XObject")) else {
        return Vec::new();
    };
    xobjects
        .iter()
        .filter(|(_, obj)| {
            resolve(doc, obj)
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|o| o.as_name().ok())
                .is_some_and(|name| name == b"Image")
        })
        .map(|(name, _)| name.clone())
        .collect()
}

// ===== CONTENT STREAM INTERPRETATION =====

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Positioned content recovered from one page, in PDF user space until shifted
#[derive(Debug, Clone)]
enum PageEvent {
    Text {
        text: String,
        font_size: f32,
        x0: f32,
        x1: f32,
        baseline: f32,
    },
    Image(BoundingBox),
}

impl PageEvent {
    /// Move into top-left-origin page space
    fn shifted(self, origin_x: f32, origin_y: f32, height: f32) -> PageEvent {
        match self {
            PageEvent::Text { text, font_size, x0, x1, baseline } => PageEvent::Text {
                text,
                font_size,
                x0: x0 - origin_x,
                x1: x1 - origin_x,
                baseline: height - (baseline - origin_y),
            },
            PageEvent::Image(b) => PageEvent::Image(BoundingBox::new(
                b.x0 - origin_x,
                height - (b.y1 - origin_y),
                b.x1 - origin_x,
                height - (b.y0 - origin_y),
            )),
        }
    }
}

struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            font: Vec::new(),
            font_size: 0.0,
            leading: 0.0,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Font size after text and graphics scaling
    fn effective_font_size(&self) -> f32 {
        let m = multiply(&self.tm, &self.ctm);
        (m[2] * m[2] + m[3] * m[3]).sqrt() * self.font_size
    }
}

fn operand_f32(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(object_to_f32)
}

fn operand_matrix(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f32> = operands.iter().filter_map(object_to_f32).collect();
    <[f32; 6]>::try_from(values).ok()
}

/// Horizontal advance estimate in unscaled text space (em units).
/// No glyph metrics are read: wide (CJK) glyphs take a full em, others half.
fn estimate_advance(text: &str) -> f32 {
    text.chars()
        .map(|c| if (c as u32) >= 0x2E80 { 1.0 } else { 0.5 })
        .sum()
}

fn show_text(state: &mut TextState, text: String, events: &mut Vec<PageEvent>) {
    if text.is_empty() {
        return;
    }
    let advance = estimate_advance(&text) * state.font_size;
    let render = multiply(&state.tm, &state.ctm);
    let (x0, baseline) = apply(&render, 0.0, 0.0);
    let (x1, _) = apply(&render, advance, 0.0);
    let font_size = state.effective_font_size();

    state.tm = multiply(&translation(advance, 0.0), &state.tm);

    if !text.trim().is_empty() {
        events.push(PageEvent::Text {
            text,
            font_size,
            x0: x0.min(x1),
            x1: x0.max(x1),
            baseline,
        });
    }
}

fn interpret_page(doc: &Document, page_id: ObjectId) -> Result<Vec<PageEvent>, String> {
    let content_bytes = doc
        .get_page_content(page_id)
        .map_err(|e| format!("failed to read page content: {e}"))?;
    let content =
        Content::decode(&content_bytes).map_err(|e| format!("failed to decode content stream: {e}"))?;

    let resources = resolve_inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok());
    let fonts = load_fonts(doc, resources);
    let images = image_xobjects(doc, resources);
    let fallback_decoder = FontDecoder::default();

    let mut state = TextState::new();
    let mut events = Vec::new();

    for op in &content.operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = operand_matrix(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    state.font = name.to_vec();
                }
                state.font_size = operand_f32(operands, 1).unwrap_or(state.font_size);
            }
            "TL" => state.leading = operand_f32(operands, 0).unwrap_or(state.leading),
            "Td" => {
                let tx = operand_f32(operands, 0).unwrap_or(0.0);
                let ty = operand_f32(operands, 1).unwrap_or(0.0);
                state.move_line(tx, ty);
            }
            "TD" => {
                let tx = operand_f32(operands, 0).unwrap_or(0.0);
                let ty = operand_f32(operands, 1).unwrap_or(0.0);
                state.leading = -ty;
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = operand_matrix(operands) {
                    state.tm = m;
                    state.tlm = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    state.next_line();
                }
                // `"` carries word and char spacing before the string
                if let Some(Object::String(bytes, _)) = operands.last() {
                    let decoder = fonts.get(&state.font).unwrap_or(&fallback_decoder);
                    show_text(&mut state, decoder.decode(bytes), &mut events);
                }
            }
            "TJ" => {
                let Some(Object::Array(items)) = operands.first() else { continue };
                let decoder = fonts.get(&state.font).unwrap_or(&fallback_decoder);
                let mut text = String::new();
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decoder.decode(bytes)),
                        other => {
                            if let Some(adjust) = object_to_f32(other) {
                                if -adjust > TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                }
                show_text(&mut state, text, &mut events);
            }
            "Do" => {
                let Some(name) = operands.first().and_then(|o| o.as_name().ok()) else { continue };
                if images.iter().any(|img| img.as_slice() == name) {
                    let (ax, ay) = apply(&state.ctm, 0.0, 0.0);
                    let (bx, by) = apply(&state.ctm, 1.0, 1.0);
                    events.push(PageEvent::Image(BoundingBox::new(ax, ay, bx, by)));
                }
            }
            _ => {}
        }
    }

    Ok(events)
}

// ===== LINE AND BLOCK GROUPING =====

struct LineBuilder {
    baseline: f32,
    size: f32,
    bbox: BoundingBox,
    spans: Vec<RawSpan>,
}

impl LineBuilder {
    fn accepts(&self, baseline: f32, x0: f32, size: f32) -> bool {
        let tolerance = 0.5 * self.size.max(size);
        (baseline - self.baseline).abs() <= tolerance && x0 >= self.bbox.x0 - tolerance
    }

    fn finish(self) -> RawLine {
        RawLine {
            bbox: self.bbox,
            spans: self.spans,
        }
    }
}

fn group_lines(events: &[PageEvent]) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for event in events {
        let PageEvent::Text { text, font_size, x0, x1, baseline } = event else { continue };
        let size = font_size.max(1.0);
        let bbox = BoundingBox::new(*x0, baseline - 0.8 * size, *x1, baseline + 0.2 * size);

        match current.as_mut() {
            Some(line) if line.accepts(*baseline, *x0, size) => {
                let mut text = text.clone();
                let gap = x0 - line.bbox.x1;
                let ends_with_space = line.spans.last().is_some_and(|s| s.text.ends_with(' '));
                if gap > 0.25 * size && !ends_with_space && !text.starts_with(' ') {
                    text.insert(0, ' ');
                }
                line.bbox = line.bbox.union(&bbox);
                line.size = line.size.max(size);
                line.spans.push(RawSpan { text, font_size: *font_size, bbox });
            }
            _ => {
                if let Some(done) = current.take() {
                    lines.push(done.finish());
                }
                current = Some(LineBuilder {
                    baseline: *baseline,
                    size,
                    bbox,
                    spans: vec![RawSpan {
                        text: text.clone(),
                        font_size: *font_size,
                        bbox,
                    }],
                });
            }
        }
    }
    if let Some(done) = current {
        lines.push(done.finish());
    }
    lines
}

fn group_blocks(events: Vec<PageEvent>) -> Vec<RawBlock> {
    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut pending: Vec<RawLine> = Vec::new();

    let flush = |pending: &mut Vec<RawLine>, blocks: &mut Vec<RawBlock>| {
        if let Some(first) = pending.first() {
            let bbox = pending.iter().fold(first.bbox, |acc, l| acc.union(&l.bbox));
            blocks.push(RawBlock::Text {
                bbox,
                lines: std::mem::take(pending),
            });
        }
    };

    for line in group_lines(&events) {
        if let Some(prev) = pending.last() {
            let size = line.max_font_size().unwrap_or(10.0);
            let vertical_gap = line.bbox.y0 - prev.bbox.y1;
            let overlaps = line.bbox.x0 < prev.bbox.x1 && line.bbox.x1 > prev.bbox.x0;
            if vertical_gap > size || vertical_gap < -size || !overlaps {
                flush(&mut pending, &mut blocks);
            }
        }
        pending.push(line);
    }
    flush(&mut pending, &mut blocks);

    for event in events {
        if let PageEvent::Image(bbox) = event {
            blocks.push(RawBlock::Image { bbox });
        }
    }

    blocks.sort_by(|a, b| {
        let (a, b) = (a.bbox(), b.bbox());
        a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0))
    });
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn build_pdf(content: &[u8], with_image: bool, encrypted: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut resources = dictionary! {
            "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
        };
        if with_image {
            let image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2i64,
                    "Height" => 2i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8i64,
                },
                vec![255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 0],
            );
            let image_id = doc.add_object(Object::Stream(image));
            resources.set("XObject", Object::Dictionary(dictionary! { "Im0" => image_id }));
        }

        let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content.to_vec())));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(resources),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if encrypted {
            doc.trailer.set(
                "Encrypt",
                Object::Dictionary(dictionary! {
                    "Filter" => "Standard",
                    "V" => 1i64,
                    "R" => 2i64,
                }),
            );
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    fn all_lines(doc: &RawDocument) -> Vec<RawLine> {
        doc.pages[0]
            .blocks
            .iter()
            .filter_map(|b| match b {
                RawBlock::Text { lines, .. } => Some(lines.clone()),
                RawBlock::Image { .. } => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn extracts_text_lines_with_font_size() {
        let pdf = build_pdf(
            b"BT /F1 12 Tf 72 700 Td (Hello world) Tj 0 -20 Td (Second line) Tj ET",
            false,
            false,
        );
        let doc = LopdfBackend::new().open(&pdf).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].number, 1);

        let lines = all_lines(&doc);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Hello world");
        assert_eq!(lines[1].text(), "Second line");
        assert!((lines[0].max_font_size().unwrap() - 12.0).abs() < 0.01);

        // Top-left origin: the first line sits above the second
        assert!(lines[0].bbox.y0 < lines[1].bbox.y0);
        assert!((lines[0].bbox.x0 - 72.0).abs() < 0.01);
    }

    #[test]
    fn tj_array_gaps_become_spaces() {
        let pdf = build_pdf(b"BT /F1 10 Tf 50 500 Td [(Deep) -400 (Learning)] TJ ET", false, false);
        let doc = LopdfBackend::new().open(&pdf).unwrap();
        assert_eq!(all_lines(&doc)[0].text(), "Deep Learning");
    }

    #[test]
    fn image_xobjects_become_image_blocks() {
        let pdf = build_pdf(b"q 200 0 0 150 100 300 cm /Im0 Do Q", true, false);
        let doc = LopdfBackend::new().open(&pdf).unwrap();
        let images: Vec<BoundingBox> = doc.pages[0]
            .blocks
            .iter()
            .filter_map(|b| match b {
                RawBlock::Image { bbox } => Some(*bbox),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 1);
        let bbox = images[0];
        assert!((bbox.x0 - 100.0).abs() < 0.01);
        assert!((bbox.x1 - 300.0).abs() < 0.01);
        // PDF y 300..450 flipped on a 792pt page
        assert!((bbox.y0 - 342.0).abs() < 0.01);
        assert!((bbox.y1 - 492.0).abs() < 0.01);
    }

    #[test]
    fn garbage_bytes_are_invalid() {
        let err = LopdfBackend::new().open(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, BackendError::Invalid(_)));
    }

    #[test]
    fn trailer_encrypt_entry_is_reported() {
        let pdf = build_pdf(b"BT /F1 12 Tf 72 700 Td (Secret) Tj ET", false, true);
        assert!(trailer_declares_encryption(&pdf));
        let err = LopdfBackend::new().open(&pdf).unwrap_err();
        assert!(matches!(err, BackendError::Encrypted));
    }

    #[test]
    fn encrypt_name_in_page_text_is_not_encryption() {
        let pdf = build_pdf(
            b"BT /F1 10 Tf 72 720 Td (Set the /Encrypt key in the trailer dictionary.) Tj ET",
            false,
            false,
        );
        assert!(find(&pdf, b"/Encrypt").is_some());
        assert!(!trailer_declares_encryption(&pdf));

        let doc = LopdfBackend::new().open(&pdf).unwrap();
        assert_eq!(
            all_lines(&doc)[0].text(),
            "Set the /Encrypt key in the trailer dictionary."
        );
    }

    #[test]
    fn xref_section_is_read_from_startxref_offset() {
        let pdf = b"%PDF-1.4\n(/Encrypt) Tj\nxref\n0 1\ntrailer\n<< /Size 1 >>\nstartxref\n23\n%%EOF";
        let section = last_xref_section(pdf).unwrap();
        assert!(section.starts_with(b"xref"));
        assert!(!trailer_declares_encryption(pdf));

        assert!(!trailer_declares_encryption(b"no cross reference here /Encrypt"));
    }
}
