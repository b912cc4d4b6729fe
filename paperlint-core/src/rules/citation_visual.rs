// Citation markers vs. reference-list entries
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// "[12] ..." or "12. ..." at the start of a reference entry
static REFERENCE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+)\]|^(\d+)\.").unwrap());

static MARKER_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d+)").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.citation_visual_check.enabled
}

/// Leading entry number of a reference line
pub fn reference_number(text: &str) -> Option<u64> {
    let caps = REFERENCE_NUMBER.captures(text.trim_start())?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}

pub fn check(elements: &[Element], _config: &RuleConfig) -> Result<Vec<Issue>> {
    let known: HashSet<u64> = elements
        .iter()
        .filter(|e| e.region == Region::Reference)
        .filter_map(|e| reference_number(&e.content))
        .collect();

    let mut issues = Vec::new();
    for citation in elements.iter().filter(|e| e.kind == ElementKind::Citation) {
        let Some(number) = MARKER_NUMBER
            .captures(&citation.content)
            .and_then(|c| c[1].parse::<u64>().ok())
        else {
            continue;
        };
        if !known.contains(&number) {
            issues.push(Issue::at(
                issue_types::CITATION_VISUAL_FAULT,
                Severity::Warning,
                citation,
                citation.content.clone(),
                "引用标注在参考文献区未找到对应条目",
            ));
        }
    }

    Ok(issues)
}
