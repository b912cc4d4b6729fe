// Raw page model produced by document-parsing backends
//
// This module defines the boundary between document decoding (PDF bytes -> text
// runs, font metrics, image regions) and structural extraction (raw runs ->
// classified Elements). Backends only have to fill these types; everything
// after this point is format-agnostic.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

/// A decoded document: pages in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    /// 1-based page number
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<RawBlock>,
    /// Set when the backend could not decode this page's content.
    /// The page contributes no blocks; extraction continues with the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawPage {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            blocks: Vec::new(),
            error: None,
        }
    }

    pub fn full_bbox(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &RawBlock> {
        self.blocks.iter().filter(|b| b.is_text())
    }

    /// All extractable text on the page, lines joined by newlines.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            if let RawBlock::Text { lines, .. } = block {
                for line in lines {
                    text.push_str(&line.text());
                    text.push('\n');
                }
            }
        }
        text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawBlock {
    Text { bbox: BoundingBox, lines: Vec<RawLine> },
    Image { bbox: BoundingBox },
}

impl RawBlock {
    pub fn bbox(&self) -> BoundingBox {
        match self {
            RawBlock::Text { bbox, .. } | RawBlock::Image { bbox } => *bbox,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, RawBlock::Text { .. })
    }
}

/// A visual line as grouped by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLine {
    pub bbox: BoundingBox,
    pub spans: Vec<RawSpan>,
}

impl RawLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Largest font size among the line's spans
    pub fn max_font_size(&self) -> Option<f32> {
        self.spans
            .iter()
            .map(|s| s.font_size)
            .filter(|s| *s > 0.0)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f32| a.max(s))))
    }
}

/// A run of text sharing one font size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSpan {
    pub text: String,
    pub font_size: f32,
    pub bbox: BoundingBox,
}
