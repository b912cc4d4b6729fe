// Formula numbering, referencing and right alignment
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:（(\d+)）|\((\d+)\))$").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.formula_check.enabled
}

fn formula_number(content: &str) -> Option<&str> {
    let caps = TRAILING_NUMBER.captures(content.trim_end())?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Matches "式N", "式(N)", "公式（N）" with nothing numeric after N
fn reference_pattern(number: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(r"式\s*[（(]?{number}(?:\D|$)"))?)
}

pub fn check(elements: &[Element], config: &RuleConfig) -> Result<Vec<Issue>> {
    let formulas: Vec<&Element> = elements
        .iter()
        .filter(|e| e.kind == ElementKind::Formula)
        .collect();
    if formulas.is_empty() {
        return Ok(Vec::new());
    }

    // Rightmost observed edge per page
    let mut page_right: HashMap<u32, f32> = HashMap::new();
    for element in elements {
        let right = page_right.entry(element.page_num).or_insert(element.bbox.x1);
        *right = right.max(element.bbox.x1);
    }

    let body: Vec<&str> = elements
        .iter()
        .filter(|e| e.kind != ElementKind::Formula && !e.is_image())
        .map(|e| e.content.as_str())
        .collect();

    let ratio = config.formula_check.right_align_ratio;
    let mut issues = Vec::new();

    for formula in formulas {
        let Some(number) = formula_number(&formula.content) else {
            issues.push(Issue::at(
                issue_types::FORMULA_MISSING,
                Severity::Warning,
                formula,
                formula.content.clone(),
                "公式缺少编号",
            ));
            continue;
        };

        let pattern = reference_pattern(number)?;
        if !body.iter().any(|text| pattern.is_match(text)) {
            issues.push(Issue::at(
                issue_types::FORMULA_REF_MISSING,
                Severity::Info,
                formula,
                formula.content.clone(),
                format!("公式({number})未在正文中被引用"),
            ));
        }

        let max_right = page_right
            .get(&formula.page_num)
            .copied()
            .unwrap_or(formula.bbox.x1);
        if formula.bbox.x1 < max_right * ratio {
            issues.push(Issue::at(
                issue_types::FORMULA_MISALIGNED,
                Severity::Warning,
                formula,
                formula.content.clone(),
                format!("公式({number})的编号未右对齐"),
            ));
        }
    }

    Ok(issues)
}
