use serde::{Deserialize, Serialize};
use std::fmt;

// ===== ELEMENT MODEL =====
// Elements are produced once per extraction pass by the structural extractor
// and consumed read-only by every downstream checker.

/// Rectangle in page space: origin at the top-left corner, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    /// Build a box, swapping coordinates so that `x0 <= x1` and `y0 <= y1` always hold.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x0, self.y0, self.x1, self.y1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Title,
    Formula,
    Citation,
}

/// Semantic zone assigned to an element at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Main,
    Chart,
    Formula,
    Title,
    Reference,
    Citation,
}

impl Region {
    /// Element kind a text line in this region is emitted as.
    pub fn line_kind(self) -> ElementKind {
        match self {
            Region::Title => ElementKind::Title,
            Region::Formula => ElementKind::Formula,
            _ => ElementKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub content: String,
    pub bbox: BoundingBox,
    /// 1-based page number
    pub page_num: u32,
    pub region: Region,
    /// Traceability only, never interpreted by the checkers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

impl Element {
    pub fn new(kind: ElementKind, content: impl Into<String>, bbox: BoundingBox, page_num: u32, region: Region) -> Self {
        Self {
            kind,
            content: content.into(),
            bbox,
            page_num: page_num.max(1),
            region,
            paper_id: None,
            chunk_id: None,
        }
    }

    pub fn image(bbox: BoundingBox, page_num: u32) -> Self {
        Self::new(ElementKind::Image, String::new(), bbox, page_num, Region::Chart)
    }

    pub fn is_image(&self) -> bool {
        self.kind == ElementKind::Image
    }
}

// ===== ISSUE MODEL =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// Coarse bucket derived from the numeric score.
pub type AuditLevel = Severity;

/// Symbolic issue codes emitted by the layout and semantic checkers.
pub mod issue_types {
    pub const LABEL_MISSING: &str = "Label_Missing";
    pub const FORMULA_MISSING: &str = "Formula_Missing";
    pub const FORMULA_REF_MISSING: &str = "Formula_Ref_Missing";
    pub const FORMULA_MISALIGNED: &str = "Formula_Misaligned";
    pub const HIERARCHY_FAULT: &str = "Hierarchy_Fault";
    pub const CITATION_VISUAL_FAULT: &str = "Citation_Visual_Fault";
    pub const TERMINOLOGY_INCONSISTENT: &str = "Terminology_Inconsistent";
    pub const TERMINOLOGY_FORBIDDEN: &str = "Terminology_Forbidden";
    pub const CITATION_STYLE_INCONSISTENT: &str = "Citation_Style_Inconsistent";
    pub const CITATION_STYLE_MISMATCH: &str = "Citation_Style_Mismatch";
    pub const REFERENCE_LIST_MISSING: &str = "Reference_List_Missing";
    pub const CITATION_REFERENCE_MISSING: &str = "Citation_Reference_Missing";
    pub const TYPO_SUSPECTED: &str = "Typo_Suspected";
    pub const TYPO_EXCESSIVE: &str = "Typo_Excessive";
    pub const PUNCTUATION_ERROR: &str = "Punctuation_Error";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_type: String,
    pub severity: Severity,
    /// Absent for document-level semantic issues
    pub page_num: Option<u32>,
    pub bbox: Option<BoundingBox>,
    pub evidence: String,
    pub message: String,
    /// Filled in by the anchor generator
    pub anchor_id: Option<String>,
    pub highlight: Option<BoundingBox>,
}

impl Issue {
    /// Issue located on a page, anchored to an element's box.
    pub fn at(
        issue_type: &str,
        severity: Severity,
        element: &Element,
        evidence: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issue_type: issue_type.to_string(),
            severity,
            page_num: Some(element.page_num),
            bbox: Some(element.bbox),
            evidence: evidence.into(),
            message: message.into(),
            anchor_id: None,
            highlight: None,
        }
    }

    /// Document-level issue without a position.
    pub fn document(
        issue_type: &str,
        severity: Severity,
        evidence: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issue_type: issue_type.to_string(),
            severity,
            page_num: None,
            bbox: None,
            evidence: evidence.into(),
            message: message.into(),
            anchor_id: None,
            highlight: None,
        }
    }
}

// ===== EXTRACTION METADATA =====

/// Document-level extraction summary, one per extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    pub encrypted: bool,
    /// Pages with near-zero extractable text (likely image-only)
    pub scanned_pages: u32,
    /// Pages split into two horizontal column groups
    pub multi_column_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
}

pub mod parse_error_types {
    pub const INVALID_PDF: &str = "invalid_pdf";
    pub const ENCRYPTED_PDF: &str = "encrypted_pdf";
    pub const LAYOUT_TIMEOUT: &str = "layout_timeout";
    pub const PAGE_PARSE_FAILED: &str = "page_parse_failed";
}

impl ParseError {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.to_string(),
            message: message.into(),
            page_num: None,
        }
    }

    pub fn on_page(error_type: &str, message: impl Into<String>, page_num: u32) -> Self {
        Self {
            page_num: Some(page_num),
            ..Self::new(error_type, message)
        }
    }
}

/// Output of one extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub elements: Vec<Element>,
    pub parse_errors: Vec<ParseError>,
    pub parse_report: ParseReport,
}

// ===== SEMANTIC STAGE OUTPUT =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticResult {
    pub semantic_issues: Vec<Issue>,
    /// Opaque advisory text from the LLM pass, empty when unavailable
    pub llm_feedback: String,
    pub score: u8,
}
