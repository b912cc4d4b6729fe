// Heading hierarchy check
//
// Numbered titles ("2", "2.3", "2.3.1") are compared with the previous
// numbered title only: a level may deepen by one at a time, and siblings must
// count up without gaps.

use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

static DOTTED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?(?:\s|$|[^\d.])").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.heading_check.enabled
}

/// "2.3.1 Setup" → [2, 3, 1]
pub fn heading_numbers(text: &str) -> Option<Vec<u32>> {
    let caps = DOTTED_PREFIX.captures(text.trim_start())?;
    caps.get(1)?
        .as_str()
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

pub fn check(elements: &[Element], _config: &RuleConfig) -> Result<Vec<Issue>> {
    let headings: Vec<(&Element, Vec<u32>)> = elements
        .iter()
        .filter(|e| e.region == Region::Title)
        .filter_map(|e| heading_numbers(&e.content).map(|nums| (e, nums)))
        .collect();

    let mut issues = Vec::new();
    for pair in headings.windows(2) {
        let [(_, prev), (element, current)] = pair else { continue };

        let skipped_level = current.len() > prev.len() + 1;
        let skipped_sibling = current.len() == prev.len()
            && matches!(
                (prev.last(), current.last()),
                (Some(p), Some(c)) if *c > p.saturating_add(1)
            );

        if skipped_level {
            issues.push(Issue::at(
                issue_types::HIERARCHY_FAULT,
                Severity::Warning,
                element,
                element.content.clone(),
                format!("标题层级从第{}级跳到第{}级", prev.len(), current.len()),
            ));
        } else if skipped_sibling {
            issues.push(Issue::at(
                issue_types::HIERARCHY_FAULT,
                Severity::Warning,
                element,
                element.content.clone(),
                "同级标题序号不连续",
            ));
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(texts: &[&str]) -> Vec<Element> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let y = 50.0 + 30.0 * i as f32;
                Element::new(
                    ElementKind::Title,
                    *t,
                    BoundingBox::new(50.0, y, 300.0, y + 14.0),
                    1,
                    Region::Title,
                )
            })
            .collect()
    }

    fn run(texts: &[&str]) -> Vec<Issue> {
        check(&titles(texts), &RuleConfig::default()).unwrap()
    }

    #[test]
    fn parses_dotted_prefixes() {
        assert_eq!(heading_numbers("1. Introduction"), Some(vec![1]));
        assert_eq!(heading_numbers("2.3.1 实验设置"), Some(vec![2, 3, 1]));
        assert_eq!(heading_numbers("3.2、方法"), Some(vec![3, 2]));
        assert_eq!(heading_numbers("Introduction"), None);
        assert_eq!(heading_numbers("第三章 方法"), None);
    }

    #[test]
    fn skipped_level_is_flagged_on_second_heading() {
        let elements = titles(&["1. Introduction", "1.1.1 Detail"]);
        let issues = check(&elements, &RuleConfig::default()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, issue_types::HIERARCHY_FAULT);
        assert_eq!(issues[0].evidence, "1.1.1 Detail");
        assert_eq!(issues[0].bbox, Some(elements[1].bbox));
    }

    #[test]
    fn well_formed_outline_passes() {
        assert!(run(&["1 引言", "1.1 背景", "1.1.1 细节", "1.2 目标", "2 方法", "2.1 数据"]).is_empty());
    }

    #[test]
    fn skipped_sibling_number_is_flagged() {
        let issues = run(&["1 引言", "1.1 背景", "1.3 目标"]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "1.3 目标");
    }

    #[test]
    fn non_title_regions_are_ignored() {
        let mut elements = titles(&["1. Introduction", "1.1.1 Detail"]);
        elements[1].region = Region::Main;
        assert!(check(&elements, &RuleConfig::default()).unwrap().is_empty());
    }
}
