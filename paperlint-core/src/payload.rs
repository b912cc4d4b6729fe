use crate::types::*;
use serde::{Deserialize, Serialize};

/// Core layout output handed to the API boundary.
///
/// `anchors` carries the same issues as `layout_issues`; front-ends read it
/// under its own name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutPayload {
    pub elements: Vec<Element>,
    pub layout_issues: Vec<Issue>,
    pub anchors: Vec<Issue>,
    pub parse_errors: Vec<ParseError>,
    pub parse_report: ParseReport,
}

impl LayoutPayload {
    pub fn new(extraction: Extraction, layout_issues: Vec<Issue>) -> Self {
        Self {
            elements: extraction.elements,
            anchors: layout_issues.clone(),
            layout_issues,
            parse_errors: extraction.parse_errors,
            parse_report: extraction.parse_report,
        }
    }

    /// Empty result substituted when layout analysis exceeds its deadline.
    pub fn timed_out() -> Self {
        Self {
            parse_errors: vec![ParseError::new(
                parse_error_types::LAYOUT_TIMEOUT,
                "layout analysis timed out",
            )],
            ..Self::default()
        }
    }

    pub fn is_timed_out(&self) -> bool {
        self.parse_errors
            .iter()
            .any(|e| e.error_type == parse_error_types::LAYOUT_TIMEOUT)
    }

    pub fn frontend(&self) -> FrontendPayload {
        FrontendPayload::from_issues(&self.anchors)
    }
}

// ===== FRONT-END ADAPTER =====

/// One highlight box per anchored issue, ready for a PDF viewer overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub anchor_id: String,
    pub page_num: u32,
    pub bbox: BoundingBox,
    pub highlight: BoundingBox,
    pub severity: Severity,
    pub issue_type: String,
    pub message: String,
    pub evidence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendPayload {
    pub highlights: Vec<Highlight>,
}

impl FrontendPayload {
    /// Issues without an anchor or a page position have nothing to draw and are skipped.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let highlights = issues
            .iter()
            .filter_map(|issue| {
                let anchor_id = issue.anchor_id.clone()?;
                let page_num = issue.page_num?;
                let bbox = issue.bbox?;
                Some(Highlight {
                    anchor_id,
                    page_num,
                    bbox,
                    highlight: issue.highlight.unwrap_or(bbox),
                    severity: issue.severity,
                    issue_type: issue.issue_type.clone(),
                    message: issue.message.clone(),
                    evidence: issue.evidence.clone(),
                })
            })
            .collect();
        Self { highlights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::generate_anchors;

    #[test]
    fn timed_out_payload_is_empty_with_one_error() {
        let payload = LayoutPayload::timed_out();
        assert!(payload.elements.is_empty());
        assert!(payload.layout_issues.is_empty());
        assert_eq!(payload.parse_errors.len(), 1);
        assert_eq!(payload.parse_errors[0].error_type, parse_error_types::LAYOUT_TIMEOUT);
        assert!(payload.is_timed_out());
    }

    #[test]
    fn anchors_mirror_layout_issues() {
        let element = Element::new(
            ElementKind::Text,
            "见图1所示",
            BoundingBox::new(50.0, 100.0, 300.0, 112.0),
            2,
            Region::Main,
        );
        let issues = generate_anchors(vec![Issue::at(
            issue_types::LABEL_MISSING,
            Severity::Warning,
            &element,
            "图1",
            "missing",
        )]);
        let payload = LayoutPayload::new(Extraction::default(), issues);
        assert_eq!(payload.anchors, payload.layout_issues);
        assert!(!payload.is_timed_out());

        let frontend = payload.frontend();
        assert_eq!(frontend.highlights.len(), 1);
        let highlight = &frontend.highlights[0];
        assert_eq!(highlight.page_num, 2);
        assert_eq!(highlight.highlight, element.bbox);
        assert_eq!(Some(highlight.anchor_id.clone()), payload.anchors[0].anchor_id);
    }

    #[test]
    fn unanchored_issues_have_no_highlight() {
        let issues = vec![Issue::document(
            issue_types::REFERENCE_LIST_MISSING,
            Severity::Critical,
            "",
            "no references",
        )];
        assert!(FrontendPayload::from_issues(&issues).highlights.is_empty());
    }
}
