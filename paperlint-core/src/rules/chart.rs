// Figure/table label checks
//
// - every "见图N"/"见表N" in the text needs a caption starting with "图N"/"表N"
// - every caption needs an image on its page
// - figures are captioned below the image, tables above

use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

static IN_TEXT_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"见(图|表)\s*(\d+)").unwrap());

static CAPTION_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(图|表)\s*(\d+)").unwrap());

pub fn enabled(config: &RuleConfig) -> bool {
    config.chart_check.enabled
}

/// (label char, number) of a caption element, e.g. ("图", "3")
fn caption_label(element: &Element) -> Option<(&str, &str)> {
    let caps = CAPTION_LABEL.captures(element.content.trim_start())?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

pub fn check(elements: &[Element], _config: &RuleConfig) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    let captions: Vec<(&Element, &str, &str)> = elements
        .iter()
        .filter(|e| e.region == Region::Chart && !e.is_image())
        .filter_map(|e| caption_label(e).map(|(kind, num)| (e, kind, num)))
        .collect();

    // In-text references without a matching caption
    for element in elements {
        if element.is_image() || element.region == Region::Chart || element.kind == ElementKind::Citation {
            continue;
        }
        for caps in IN_TEXT_REFERENCE.captures_iter(&element.content) {
            let (kind, num) = (&caps[1], &caps[2]);
            let has_caption = captions.iter().any(|(_, k, n)| *k == kind && *n == num);
            if !has_caption {
                issues.push(Issue::at(
                    issue_types::LABEL_MISSING,
                    Severity::Warning,
                    element,
                    &caps[0],
                    format!("正文引用了{kind}{num}，但未找到对应的{kind}题"),
                ));
            }
        }
    }

    // Caption placement relative to the nearest image on the same page
    for (caption, kind, num) in &captions {
        let nearest = elements
            .iter()
            .filter(|e| e.is_image() && e.page_num == caption.page_num)
            .min_by(|a, b| {
                let da = (a.bbox.center_y() - caption.bbox.center_y()).abs();
                let db = (b.bbox.center_y() - caption.bbox.center_y()).abs();
                da.total_cmp(&db)
            });

        let Some(image) = nearest else {
            issues.push(Issue::at(
                issue_types::LABEL_MISSING,
                Severity::Warning,
                caption,
                caption.content.clone(),
                format!("{kind}{num}的题注所在页面没有对应的{kind}"),
            ));
            continue;
        };

        let caption_above = caption.bbox.center_y() < image.bbox.center_y();
        let misplaced = match *kind {
            "图" => caption_above,
            _ => !caption_above,
        };
        if misplaced {
            let expected = if *kind == "图" { "下方" } else { "上方" };
            issues.push(Issue::at(
                issue_types::LABEL_MISSING,
                Severity::Warning,
                caption,
                caption.content.clone(),
                format!("{kind}{num}的题注应位于{kind}的{expected}"),
            ));
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str, y: f32) -> Element {
        Element::new(
            ElementKind::Text,
            content,
            BoundingBox::new(50.0, y, 400.0, y + 12.0),
            1,
            Region::Main,
        )
    }

    fn caption(content: &str, y: f32) -> Element {
        Element::new(
            ElementKind::Text,
            content,
            BoundingBox::new(150.0, y, 350.0, y + 12.0),
            1,
            Region::Chart,
        )
    }

    fn image(y0: f32, y1: f32) -> Element {
        Element::image(BoundingBox::new(100.0, y0, 400.0, y1), 1)
    }

    fn run(elements: &[Element]) -> Vec<Issue> {
        check(elements, &RuleConfig::default()).unwrap()
    }

    #[test]
    fn reference_without_caption_is_flagged() {
        let elements = vec![text("实验结果见图1所示。", 100.0)];
        let issues = run(&elements);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, issue_types::LABEL_MISSING);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].evidence, "见图1");
        assert_eq!(issues[0].page_num, Some(1));
        assert_eq!(issues[0].bbox, Some(elements[0].bbox));
    }

    #[test]
    fn caption_number_must_match_exactly() {
        let elements = vec![
            text("详见图1。", 100.0),
            image(200.0, 400.0),
            caption("图12 误差曲线", 410.0),
        ];
        let issues = run(&elements);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "见图1");
    }

    #[test]
    fn figure_caption_below_image_passes() {
        let elements = vec![
            text("结构见图1。", 100.0),
            image(200.0, 400.0),
            caption("图1 系统结构", 410.0),
        ];
        assert!(run(&elements).is_empty());
    }

    #[test]
    fn figure_caption_above_image_is_flagged() {
        let elements = vec![caption("图1 系统结构", 180.0), image(200.0, 400.0)];
        let issues = run(&elements);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "图1 系统结构");
    }

    #[test]
    fn table_caption_below_table_is_flagged() {
        let above = vec![caption("表1 参数设置", 180.0), image(200.0, 400.0)];
        assert!(run(&above).is_empty());

        let below = vec![image(200.0, 400.0), caption("表1 参数设置", 410.0)];
        assert_eq!(run(&below).len(), 1);
    }

    #[test]
    fn caption_without_image_on_page_is_flagged() {
        let mut other_page = image(200.0, 400.0);
        other_page.page_num = 2;
        let elements = vec![caption("图2 训练曲线", 410.0), other_page];
        let issues = run(&elements);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, issue_types::LABEL_MISSING);
    }
}
