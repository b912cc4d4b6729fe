use super::{SemanticInput, TermMatcher};
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use std::collections::BTreeSet;

pub fn enabled(config: &RuleConfig) -> bool {
    config.terminology_check.enabled
}

pub fn check(input: &SemanticInput, config: &RuleConfig) -> Result<Vec<Issue>> {
    let rules = &config.terminology_check;
    let mut issues = Vec::new();

    for (canonical, variants) in &rules.terms {
        // Spellings compared after lowercasing, so case-only differences don't count
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for spelling in std::iter::once(canonical).chain(variants) {
            if TermMatcher::new(spelling)?.is_match(&input.text) {
                seen.insert(spelling.to_lowercase());
            }
        }
        if seen.len() >= 2 {
            let found: Vec<&str> = seen.iter().map(String::as_str).collect();
            issues.push(Issue::document(
                issue_types::TERMINOLOGY_INCONSISTENT,
                Severity::Warning,
                found.join(", "),
                format!("术语“{canonical}”存在多种写法，建议统一"),
            ));
        }
    }

    for (canonical, forbidden) in &rules.forbidden_variants {
        for spelling in forbidden {
            if TermMatcher::new(spelling)?.is_match(&input.text) {
                issues.push(Issue::document(
                    issue_types::TERMINOLOGY_FORBIDDEN,
                    Severity::Warning,
                    spelling.clone(),
                    format!("不规范写法“{spelling}”，应使用“{canonical}”"),
                ));
            }
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RuleConfig {
        RuleConfig::from_yaml(
            r#"
terminology_check:
  terms:
    Deep Learning: [deep-learning, DL]
    卷积神经网络: [CNN]
  forbidden_variants:
    Transformer: [transformor]
"#,
        )
        .unwrap()
    }

    fn run(text: &str) -> Vec<Issue> {
        let input = SemanticInput {
            text: text.to_string(),
            references: Vec::new(),
        };
        check(&input, &config()).unwrap()
    }

    #[test]
    fn mixed_spellings_are_inconsistent() {
        let issues = run("Deep Learning is popular; deep-learning models vary.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, issue_types::TERMINOLOGY_INCONSISTENT);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].evidence, "deep learning, deep-learning");
        assert_eq!(issues[0].page_num, None);
    }

    #[test]
    fn case_only_difference_is_consistent() {
        assert!(run("Deep Learning and deep learning are the same spelling.").is_empty());
    }

    #[test]
    fn cjk_and_latin_variants_mix() {
        let issues = run("本文采用卷积神经网络，CNN 的结构如下。");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn forbidden_spelling_is_flagged() {
        let issues = run("We use a transformor encoder.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, issue_types::TERMINOLOGY_FORBIDDEN);
        assert_eq!(issues[0].evidence, "transformor");
    }
}
