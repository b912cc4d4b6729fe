// Deterministic scoring over layout + semantic issues
//
// score = clamp(100 - round(15·C + 6·√W + 2·√I), 0, 100)
// Critical issues cost linearly; repeated warnings and infos cost less each.

use crate::types::{AuditLevel, Issue, Severity};
use serde::{Deserialize, Serialize};

const CRITICAL_WEIGHT: f64 = 15.0;
const WARNING_WEIGHT: f64 = 6.0;
const INFO_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn deduction(&self) -> f64 {
        CRITICAL_WEIGHT * self.critical as f64
            + WARNING_WEIGHT * (self.warning as f64).sqrt()
            + INFO_WEIGHT * (self.info as f64).sqrt()
    }

    pub fn score(&self) -> u8 {
        (100.0 - self.deduction().round()).clamp(0.0, 100.0) as u8
    }
}

pub fn score_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> u8 {
    SeverityCounts::from_issues(issues).score()
}

/// Critical below 60, Warning below 80, Info otherwise.
pub fn audit_level(score: u8) -> AuditLevel {
    match score {
        0..=59 => Severity::Critical,
        60..=79 => Severity::Warning,
        _ => Severity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(critical: usize, warning: usize, info: usize) -> SeverityCounts {
        SeverityCounts {
            critical,
            warning,
            info,
        }
    }

    #[test]
    fn one_critical_two_warnings() {
        let c = counts(1, 2, 0);
        assert!((c.deduction() - 23.485).abs() < 0.01);
        assert_eq!(c.score(), 77);
        assert_eq!(audit_level(c.score()), Severity::Warning);
    }

    #[test]
    fn clean_document_scores_full() {
        assert_eq!(counts(0, 0, 0).score(), 100);
        assert_eq!(audit_level(100), Severity::Info);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        assert_eq!(counts(10, 0, 0).score(), 0);
        assert_eq!(audit_level(0), Severity::Critical);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(audit_level(59), Severity::Critical);
        assert_eq!(audit_level(60), Severity::Warning);
        assert_eq!(audit_level(79), Severity::Warning);
        assert_eq!(audit_level(80), Severity::Info);
    }

    #[test]
    fn counts_issues_by_severity() {
        let issues = vec![
            Issue::document("A", Severity::Info, "", ""),
            Issue::document("B", Severity::Info, "", ""),
            Issue::document("C", Severity::Info, "", ""),
            Issue::document("D", Severity::Info, "", ""),
            Issue::document("E", Severity::Warning, "", ""),
        ];
        assert_eq!(SeverityCounts::from_issues(&issues), counts(0, 1, 4));
        // 6·1 + 2·2 = 10
        assert_eq!(score_issues(&issues), 90);
    }
}
