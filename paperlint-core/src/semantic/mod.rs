//! Semantic Rule Engine
//!
//! Text-level checks that run after layout analysis:
//!
//! - `terminology`: controlled-vocabulary consistency and forbidden spellings
//! - `citation_style`: numeric vs. author-year citations, cross-matched to references
//! - `typo`: configured misspellings
//! - `punctuation`: mixed CJK/ASCII punctuation and citation placement
//!
//! Every check shares the `(SemanticInput, RuleConfig) -> Vec<Issue>` contract and
//! runs through the same isolated runner as the layout checks.

pub mod citation_style;
pub mod punctuation;
pub mod terminology;
pub mod typo;

use crate::classifier::is_reference_title;
use crate::config::RuleConfig;
use crate::llm::{advise_with_timeout, LlmAdvisor};
use crate::preprocessors::is_pdf_derived;
use crate::rules::engine::{run_checks, Check};
use crate::scoring::score_issues;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// What the semantic checks read: resolved plain text plus reference entries.
#[derive(Debug, Clone, Default)]
pub struct SemanticInput {
    pub text: String,
    /// Reference-list entries, one per line, heading excluded
    pub references: Vec<String>,
}

impl SemanticInput {
    /// Resolve text and references for a request.
    ///
    /// PDF-derived (base64) content is rebuilt from element text in extraction
    /// order; anything else is used literally.
    pub fn resolve(content: &str, elements: &[Element]) -> Self {
        let text = if is_pdf_derived(content) {
            text_from_elements(elements)
        } else {
            content.to_string()
        };
        let references = reference_entries(elements, &text);
        Self { text, references }
    }
}

/// Element contents joined by newlines; citation markers are skipped since
/// their text is already part of the containing line.
pub fn text_from_elements(elements: &[Element]) -> String {
    elements
        .iter()
        .filter(|e| !e.is_image() && e.kind != ElementKind::Citation)
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reference-region elements when extraction found any, otherwise the lines
/// following a "参考文献" heading in the plain text.
pub fn reference_entries(elements: &[Element], text: &str) -> Vec<String> {
    let from_elements: Vec<String> = elements
        .iter()
        .filter(|e| e.region == Region::Reference && !is_reference_title(&e.content))
        .map(|e| e.content.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !from_elements.is_empty() {
        return from_elements;
    }

    text.lines()
        .skip_while(|line| !is_reference_title(line))
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Semantic checks in execution order. Register new checks by extending this list.
pub const SEMANTIC_CHECKS: &[Check<SemanticInput>] = &[
    Check {
        name: "typo_check",
        enabled: typo::enabled,
        run: typo::check,
    },
    Check {
        name: "terminology_check",
        enabled: terminology::enabled,
        run: terminology::check,
    },
    Check {
        name: "punctuation_check",
        enabled: punctuation::enabled,
        run: punctuation::check,
    },
    Check {
        name: "citation_check",
        enabled: citation_style::enabled,
        run: citation_style::check,
    },
];

pub fn run_semantic_checks(input: &SemanticInput, config: &RuleConfig) -> Vec<Issue> {
    let issues = run_checks(SEMANTIC_CHECKS, input, config);
    debug!(issues = issues.len(), "semantic checks finished");
    issues
}

/// Full semantic stage: rule checks, the bounded LLM pass, and the score over
/// both issue streams.
pub async fn check_semantics(
    content: &str,
    elements: &[Element],
    layout_issues: &[Issue],
    config: &RuleConfig,
    advisor: &dyn LlmAdvisor,
    llm_timeout: Duration,
) -> SemanticResult {
    let input = SemanticInput::resolve(content, elements);
    let semantic_issues = run_semantic_checks(&input, config);
    let llm_feedback = advise_with_timeout(advisor, &input.text, llm_timeout).await;

    let score = score_issues(layout_issues.iter().chain(&semantic_issues));
    info!(
        semantic_issues = semantic_issues.len(),
        layout_issues = layout_issues.len(),
        score,
        "semantic stage finished"
    );

    SemanticResult {
        semantic_issues,
        llm_feedback,
        score,
    }
}

// ===== TERM MATCHING =====

static CJK_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]").unwrap());

/// Case-insensitive whole-word matching for alphabetic-script terms
/// (including accented Latin such as "Café"), literal substring matching for
/// terms containing CJK characters, which have no word boundaries.
#[derive(Debug, Clone)]
pub enum TermMatcher {
    Word(Regex),
    Literal(String),
}

impl TermMatcher {
    pub fn new(term: &str) -> Result<Self> {
        if term.trim().is_empty() || CJK_SCRIPT.is_match(term) {
            return Ok(TermMatcher::Literal(term.to_string()));
        }
        // A boundary only makes sense next to a word character ("C++" ends in '+')
        let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        let lead = if is_word(term.chars().next()) { r"\b" } else { "" };
        let trail = if is_word(term.chars().last()) { r"\b" } else { "" };
        let pattern = format!(r"(?i){lead}{}{trail}", regex::escape(term));
        Ok(TermMatcher::Word(Regex::new(&pattern)?))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.count(text) > 0
    }

    pub fn count(&self, text: &str) -> usize {
        match self {
            TermMatcher::Word(regex) => regex.find_iter(text).count(),
            TermMatcher::Literal(term) if term.is_empty() => 0,
            TermMatcher::Literal(term) => text.matches(term.as_str()).count(),
        }
    }
}
