use super::{SemanticInput, TermMatcher};
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;

pub fn enabled(config: &RuleConfig) -> bool {
    config.typo_check.enabled
}

/// Counts configured misspellings. A misspelled critical keyword is Critical;
/// too many typos overall adds one document-level warning.
pub fn check(input: &SemanticInput, config: &RuleConfig) -> Result<Vec<Issue>> {
    let rules = &config.typo_check;
    let mut issues = Vec::new();
    let mut total = 0usize;

    for (wrong, right) in &rules.known_typos {
        let count = TermMatcher::new(wrong)?.count(&input.text);
        if count == 0 {
            continue;
        }
        total += count;

        let critical = rules.critical_keywords.iter().any(|k| k == right);
        let severity = if critical { Severity::Critical } else { Severity::Info };
        issues.push(Issue::document(
            issue_types::TYPO_SUSPECTED,
            severity,
            wrong.clone(),
            format!("疑似错别字“{wrong}”（{count}处），应为“{right}”"),
        ));
    }

    if total > rules.max_typos_total_warning {
        issues.push(Issue::document(
            issue_types::TYPO_EXCESSIVE,
            Severity::Warning,
            total.to_string(),
            format!(
                "全文疑似错别字 {total} 处，超过上限 {}",
                rules.max_typos_total_warning
            ),
        ));
    }

    Ok(issues)
}
