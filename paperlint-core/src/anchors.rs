use crate::types::{BoundingBox, Issue};
use sha2::{Digest, Sha256};

/// Content-addressed anchor id: sha256 over "{issue_type}-{page}-{bbox}".
///
/// Missing locations hash as page 0 and an all-zero box, so the id depends on
/// nothing but the three inputs.
pub fn anchor_id(issue_type: &str, page_num: Option<u32>, bbox: Option<BoundingBox>) -> String {
    let raw = format!(
        "{}-{}-{}",
        issue_type,
        page_num.unwrap_or(0),
        bbox.unwrap_or_default()
    );
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Assign anchor ids and highlight boxes. Pure: same issues in, same ids out.
pub fn generate_anchors(issues: Vec<Issue>) -> Vec<Issue> {
    issues
        .into_iter()
        .map(|mut issue| {
            issue.anchor_id = Some(anchor_id(&issue.issue_type, issue.page_num, issue.bbox));
            issue.highlight = issue.bbox;
            issue
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{issue_types, Severity};

    fn located(issue_type: &str, page: u32, bbox: BoundingBox) -> Issue {
        Issue {
            page_num: Some(page),
            bbox: Some(bbox),
            ..Issue::document(issue_type, Severity::Warning, "evidence", "message")
        }
    }

    #[test]
    fn ids_are_stable_and_input_sensitive() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let a = anchor_id(issue_types::LABEL_MISSING, Some(1), Some(bbox));
        assert_eq!(a, anchor_id(issue_types::LABEL_MISSING, Some(1), Some(bbox)));
        assert_eq!(a.len(), 64);
        assert_ne!(a, anchor_id(issue_types::LABEL_MISSING, Some(2), Some(bbox)));
        assert_ne!(a, anchor_id(issue_types::HIERARCHY_FAULT, Some(1), Some(bbox)));
    }

    #[test]
    fn evidence_does_not_affect_id() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let mut first = located(issue_types::LABEL_MISSING, 1, bbox);
        let mut second = first.clone();
        first.evidence = "见图1".to_string();
        second.evidence = "见图2".to_string();
        let anchored = generate_anchors(vec![first, second]);
        assert_eq!(anchored[0].anchor_id, anchored[1].anchor_id);
    }

    #[test]
    fn highlight_defaults_to_bbox() {
        let bbox = BoundingBox::new(5.0, 5.0, 50.0, 20.0);
        let anchored = generate_anchors(vec![located(issue_types::HIERARCHY_FAULT, 3, bbox)]);
        assert_eq!(anchored[0].highlight, Some(bbox));
        assert!(anchored[0].anchor_id.is_some());

        let document_level = generate_anchors(vec![Issue::document(
            issue_types::REFERENCE_LIST_MISSING,
            Severity::Critical,
            "[1]",
            "no references",
        )]);
        assert_eq!(document_level[0].highlight, None);
    }
}
