// Citation style consistency and reference cross-matching
//
// Numeric ([3], [1-4]) and author-year ((Smith, 2020)) citations are extracted
// independently. Mixing them, or using the one the config does not ask for, is
// reported first; then every citation has to resolve to a reference entry.

use super::SemanticInput;
use crate::config::{CitationStyle, RuleConfig};
use crate::rules::citation_visual::reference_number;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Ranges wider than this are not expanded
const MAX_RANGE: u64 = 100;

static NUMERIC_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+(?:\s*[,，\-–]\s*\d+)*)\]").unwrap());

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[（(]([^（）()]*\d{4}[^（）()]*)[）)]").unwrap());

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})[a-z]?\b").unwrap());

static CAPITALIZED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z'\-]+)").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.citation_check.enabled
}

/// One author-year citation, e.g. ("Smith", "2020") from "Smith et al., 2020"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorYear {
    pub author: String,
    pub year: String,
    pub raw: String,
}

/// Citation numbers in order of first appearance, ranges expanded.
pub fn numeric_citations(text: &str) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut numbers = Vec::new();

    for caps in NUMERIC_CITATION.captures_iter(text) {
        for part in caps[1].split([',', '，']) {
            let bounds: Vec<u64> = part
                .split(['-', '–'])
                .filter_map(|n| n.trim().parse().ok())
                .collect();
            let expanded: Vec<u64> = match bounds.as_slice() {
                [single] => vec![*single],
                [lo, hi] if lo <= hi && hi - lo <= MAX_RANGE => (*lo..=*hi).collect(),
                other => other.to_vec(),
            };
            for n in expanded {
                if seen.insert(n) {
                    numbers.push(n);
                }
            }
        }
    }
    numbers
}

/// Parenthesized groups holding a four-digit year and a capitalized word.
/// Groups separated by `;` are separate citations.
pub fn author_year_citations(text: &str) -> Vec<AuthorYear> {
    let mut citations = Vec::new();
    for caps in PARENTHESIZED.captures_iter(text) {
        for part in caps[1].split([';', '；']) {
            let author = CAPITALIZED_WORD.captures(part).map(|c| c[1].to_string());
            let year = YEAR.captures(part).map(|c| c[1].to_string());
            if let (Some(author), Some(year)) = (author, year) {
                citations.push(AuthorYear {
                    author,
                    year,
                    raw: part.trim().to_string(),
                });
            }
        }
    }
    citations
}

pub fn check(input: &SemanticInput, config: &RuleConfig) -> Result<Vec<Issue>> {
    let numeric = numeric_citations(&input.text);
    let author_year = author_year_citations(&input.text);
    let mut issues = Vec::new();

    if numeric.is_empty() && author_year.is_empty() {
        return Ok(issues);
    }

    if !numeric.is_empty() && !author_year.is_empty() {
        issues.push(Issue::document(
            issue_types::CITATION_STYLE_INCONSISTENT,
            Severity::Warning,
            format!("[{}] / ({})", numeric[0], author_year[0].raw),
            "正文同时使用了顺序编码制和著者-出版年制引用",
        ));
    }

    let mismatch = match config.citation_check.style {
        CitationStyle::IEEE => author_year.first().map(|c| format!("({})", c.raw)),
        CitationStyle::APA => numeric.first().map(|n| format!("[{n}]")),
    };
    if let Some(evidence) = mismatch {
        issues.push(Issue::document(
            issue_types::CITATION_STYLE_MISMATCH,
            Severity::Warning,
            evidence,
            format!("引用格式与要求的 {:?} 风格不符", config.citation_check.style),
        ));
    }

    if input.references.is_empty() {
        issues.push(Issue::document(
            issue_types::REFERENCE_LIST_MISSING,
            Severity::Critical,
            "",
            "正文存在引用，但未找到参考文献列表",
        ));
        return Ok(issues);
    }

    let known: BTreeSet<u64> = input
        .references
        .iter()
        .filter_map(|entry| reference_number(entry))
        .collect();
    for number in numeric {
        if !known.contains(&number) {
            issues.push(Issue::document(
                issue_types::CITATION_REFERENCE_MISSING,
                Severity::Warning,
                format!("[{number}]"),
                format!("引用 [{number}] 在参考文献中没有对应条目"),
            ));
        }
    }

    let lowered: Vec<String> = input.references.iter().map(|r| r.to_lowercase()).collect();
    for citation in author_year {
        let author = citation.author.to_lowercase();
        let found = lowered
            .iter()
            .any(|entry| entry.contains(&author) && entry.contains(&citation.year));
        if !found {
            issues.push(Issue::document(
                issue_types::CITATION_REFERENCE_MISSING,
                Severity::Warning,
                format!("({})", citation.raw),
                format!("引用 ({}) 在参考文献中没有对应条目", citation.raw),
            ));
        }
    }

    Ok(issues)
}
