// Punctuation checks
// - ASCII , ; : ? ! between two Han characters (half-width punctuation in Chinese text)
// - a citation marker placed after the sentence-final period instead of before it

use super::SemanticInput;
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

// The following Han character is checked by hand so that it can also lead
// the next match ("甲,乙,丙" has two errors)
static HAN_THEN_HALF_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Han}[,;:?!]").unwrap());

static LEADING_HAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\p{Han}").unwrap());

static CITATION_AFTER_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[。.][ \t]*\[\d+(?:[,，\-–]\s*\d+)*\]").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.punctuation_check.enabled && !config.punctuation_check.allow_mixed_punctuation
}

pub fn check(input: &SemanticInput, _config: &RuleConfig) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    for m in HAN_THEN_HALF_WIDTH.find_iter(&input.text) {
        let Some(next) = LEADING_HAN.find(&input.text[m.end()..]) else {
            continue;
        };
        issues.push(Issue::document(
            issue_types::PUNCTUATION_ERROR,
            Severity::Info,
            format!("{}{}", m.as_str(), next.as_str()),
            "中文语句中使用了半角标点",
        ));
    }

    for m in CITATION_AFTER_PERIOD.find_iter(&input.text) {
        issues.push(Issue::document(
            issue_types::PUNCTUATION_ERROR,
            Severity::Info,
            m.as_str(),
            "引用标注应位于句末标点之前",
        ));
    }

    Ok(issues)
}
