use crate::config::{AgentSettings, RuleConfig, RuleStore, AGENT_NAME, AGENT_VERSION};
use crate::extractor;
use crate::llm::{advisor_from_settings, LlmAdvisor};
use crate::payload::LayoutPayload;
use crate::preprocessors::{LopdfBackend, PdfBackend, PdfSource};
use crate::rules::LayoutValidator;
use crate::scoring::audit_level;
use crate::semantic;
use crate::storage::{NoOpTaskStore, TaskRecord, TaskStatus, TaskStore};
use crate::types::*;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Collects timings for pipeline steps and logs them at debug level
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            debug!(
                step = step.as_str(),
                elapsed_ms = duration.as_millis() as u64,
                percentage = format!("{percentage:.1}"),
                "profile"
            );
        }
        debug!(total_ms = total.as_millis() as u64, "profile total");
    }
}

// ===== API BOUNDARY SHAPES =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub paper_id: String,
    #[serde(default)]
    pub paper_title: String,
    pub chunk_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Plain text, a filesystem path, or base64-encoded PDF bytes
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    pub request_id: String,
    pub metadata: RequestMetadata,
    pub payload: RequestPayload,
}

impl AuditRequest {
    fn validate(&self) -> Result<()> {
        if self.request_id.trim().is_empty() {
            bail!("request_id must not be empty");
        }
        if self.metadata.chunk_id.trim().is_empty() {
            bail!("metadata.chunk_id must not be empty");
        }
        if self.payload.content.is_empty() {
            bail!("payload.content must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self {
            name: AGENT_NAME.to_string(),
            version: AGENT_VERSION.to_string(),
        }
    }
}

/// Front-facing tag vocabulary
pub mod audit_tags {
    pub const CITATION_INCONSISTENCY: &str = "Citation_Inconsistency";
    pub const LABEL_MISSING: &str = "Label_Missing";
    pub const PUNCTUATION_ERROR: &str = "Punctuation_Error";
    pub const HIERARCHY_FAULT: &str = "Hierarchy_Fault";
}

/// Map an issue type onto the tag vocabulary; typo, terminology and
/// alignment issues carry no tag.
pub fn tag_for_issue(issue_type: &str) -> Option<&'static str> {
    match issue_type {
        issue_types::CITATION_STYLE_INCONSISTENT
        | issue_types::CITATION_STYLE_MISMATCH
        | issue_types::CITATION_REFERENCE_MISSING
        | issue_types::REFERENCE_LIST_MISSING
        | issue_types::CITATION_VISUAL_FAULT => Some(audit_tags::CITATION_INCONSISTENCY),
        issue_types::LABEL_MISSING | issue_types::FORMULA_MISSING | issue_types::FORMULA_REF_MISSING => {
            Some(audit_tags::LABEL_MISSING)
        }
        issue_types::PUNCTUATION_ERROR => Some(audit_tags::PUNCTUATION_ERROR),
        issue_types::HIERARCHY_FAULT => Some(audit_tags::HIERARCHY_FAULT),
        _ => None,
    }
}

/// Distinct tags in vocabulary order.
pub fn tags_for_issues(issues: &[Issue]) -> Vec<String> {
    [
        audit_tags::CITATION_INCONSISTENCY,
        audit_tags::LABEL_MISSING,
        audit_tags::PUNCTUATION_ERROR,
        audit_tags::HIERARCHY_FAULT,
    ]
    .into_iter()
    .filter(|tag| issues.iter().any(|i| tag_for_issue(&i.issue_type) == Some(*tag)))
    .map(str::to_string)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub score: u8,
    pub audit_level: AuditLevel,
    pub comment: String,
    pub suggestion: String,
    pub tags: Vec<String>,
}

impl AuditResult {
    pub fn from_issues(score: u8, issues: &[Issue]) -> Self {
        let (comment, suggestion) = if issues.is_empty() {
            ("格式审计完成。".to_string(), "请检查文中标记的格式问题。".to_string())
        } else {
            (
                format!("发现 {} 个格式问题。", issues.len()),
                "建议根据详细报告进行修改。".to_string(),
            )
        };
        Self {
            score,
            audit_level: audit_level(score),
            comment,
            suggestion,
            tags: tags_for_issues(issues),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub tokens: u64,
    pub latency_ms: u64,
}

/// Estimated token usage: four characters per token
pub fn estimate_tokens(content: &str) -> u64 {
    (content.chars().count() / 4) as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub request_id: String,
    pub agent_info: AgentInfo,
    pub result: AuditResult,
    pub usage: ResourceUsage,
    /// Layout issues followed by semantic issues
    pub issues: Vec<Issue>,
    pub llm_feedback: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_errors: Vec<ParseError>,
}

// ===== PROCESSOR =====

/// Wires extraction, layout validation, the semantic stage and persistence.
pub struct AuditProcessor {
    backend: Arc<dyn PdfBackend>,
    rules: Arc<RuleStore>,
    advisor: Box<dyn LlmAdvisor>,
    store: Box<dyn TaskStore>,
    settings: AgentSettings,
    profiling: bool,
}

impl AuditProcessor {
    /// Create AuditProcessor with full dependency injection
    pub fn new_with_dependencies(
        backend: Arc<dyn PdfBackend>,
        rules: Arc<RuleStore>,
        advisor: Box<dyn LlmAdvisor>,
        store: Box<dyn TaskStore>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            backend,
            rules,
            advisor,
            store,
            settings,
            profiling: false,
        }
    }

    /// lopdf backend, advisor chosen from `settings`, no persistence
    pub fn from_settings(rules: Arc<RuleStore>, settings: AgentSettings) -> Self {
        let advisor = advisor_from_settings(&settings);
        Self::new_with_dependencies(
            Arc::new(LopdfBackend::new()),
            rules,
            advisor,
            Box::new(NoOpTaskStore),
            settings,
        )
    }

    pub fn with_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_store(mut self, store: Box<dyn TaskStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Extract and validate an already-detected source.
    pub fn analyze_layout(&self, source: &PdfSource) -> LayoutPayload {
        let config = self.rules.current();
        let mut profiler = StepProfiler::new(self.profiling);
        let extraction = profiler.time_step("1. Extraction", || {
            extractor::extract(self.backend.as_ref(), source)
        });
        let payload = validate_extraction(extraction, &config, &mut profiler);
        profiler.log_summary();
        payload
    }

    /// Detect the source kind of `content`, then extract and validate.
    pub fn analyze_layout_content(&self, content: &str) -> LayoutPayload {
        let config = self.rules.current();
        let mut profiler = StepProfiler::new(self.profiling);
        let payload = layout_pipeline(self.backend.as_ref(), &config, content, &mut profiler);
        profiler.log_summary();
        payload
    }

    /// Layout analysis on the blocking pool under a hard deadline. Expiry
    /// yields [`LayoutPayload::timed_out`]; the abandoned work finishes in the
    /// background and its result is dropped.
    pub async fn analyze_layout_bounded(&self, content: &str, timeout: Duration) -> LayoutPayload {
        let backend = Arc::clone(&self.backend);
        let config = self.rules.current();
        let content = content.to_string();
        let profiling = self.profiling;

        let task = tokio::task::spawn_blocking(move || {
            let mut profiler = StepProfiler::new(profiling);
            let payload = layout_pipeline(backend.as_ref(), &config, &content, &mut profiler);
            profiler.log_summary();
            payload
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(join_error)) => {
                error!(error = %join_error, "layout analysis task failed");
                LayoutPayload {
                    parse_errors: vec![ParseError::new(
                        parse_error_types::INVALID_PDF,
                        format!("layout analysis failed: {join_error}"),
                    )],
                    ..LayoutPayload::default()
                }
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "layout analysis timed out");
                LayoutPayload::timed_out()
            }
        }
    }

    /// Semantic checks, LLM advisory pass and scoring over both issue streams.
    pub async fn check_semantics(&self, content: &str, layout: &LayoutPayload) -> SemanticResult {
        let config = self.rules.current();
        semantic::check_semantics(
            content,
            &layout.elements,
            &layout.layout_issues,
            &config,
            self.advisor.as_ref(),
            self.settings.llm_timeout,
        )
        .await
    }

    /// Full audit: bounded layout analysis, semantic stage, report assembly
    /// and a task record. Only a malformed request is an error; persistence
    /// failures are logged.
    pub async fn audit(&self, request: AuditRequest) -> Result<AuditReport> {
        let start = Instant::now();
        info!(
            request_id = request.request_id.as_str(),
            paper_id = request.metadata.paper_id.as_str(),
            "audit request received"
        );

        if let Err(e) = request.validate() {
            let record = TaskRecord::new(
                &request.request_id,
                &request.metadata.paper_id,
                &request.metadata.chunk_id,
                TaskStatus::Failed,
            )
            .with_error(e.to_string())
            .with_latency(start.elapsed().as_millis() as u64);
            self.persist(&record);
            return Err(e);
        }

        let content = request.payload.content.as_str();
        let layout = self
            .analyze_layout_bounded(content, self.settings.layout_timeout)
            .await;
        let semantic = self.check_semantics(content, &layout).await;

        let mut issues = layout.layout_issues;
        issues.extend(semantic.semantic_issues);

        let report = AuditReport {
            request_id: request.request_id.clone(),
            agent_info: AgentInfo::default(),
            result: AuditResult::from_issues(semantic.score, &issues),
            usage: ResourceUsage {
                tokens: estimate_tokens(content),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            issues,
            llm_feedback: semantic.llm_feedback,
            parse_errors: layout.parse_errors,
        };

        info!(
            request_id = report.request_id.as_str(),
            score = report.result.score,
            audit_level = %report.result.audit_level,
            issues = report.issues.len(),
            latency_ms = report.usage.latency_ms,
            "audit finished"
        );

        match serde_json::to_value(&report) {
            Ok(result_json) => {
                let record = TaskRecord::new(
                    &request.request_id,
                    &request.metadata.paper_id,
                    &request.metadata.chunk_id,
                    TaskStatus::Success,
                )
                .with_result(
                    report.result.score,
                    report.result.audit_level,
                    result_json,
                    report.usage.tokens,
                )
                .with_latency(report.usage.latency_ms);
                self.persist(&record);
            }
            Err(e) => warn!(error = %e, "could not serialize audit report for persistence"),
        }

        Ok(report)
    }

    fn persist(&self, record: &TaskRecord) {
        match self.store.save(record) {
            Ok(()) => debug!(task_id = %record.task_id, status = ?record.status, "task record saved"),
            Err(e) => error!(task_id = %record.task_id, error = %e, "failed to save task record"),
        }
    }
}

/// Source detection, extraction, validation and anchoring for one request.
pub fn layout_pipeline(
    backend: &dyn PdfBackend,
    config: &RuleConfig,
    content: &str,
    profiler: &mut StepProfiler,
) -> LayoutPayload {
    let extraction = profiler.time_step("1. Extraction", || {
        extractor::extract_content(backend, content)
    });
    validate_extraction(extraction, config, profiler)
}

fn validate_extraction(
    extraction: Extraction,
    config: &RuleConfig,
    profiler: &mut StepProfiler,
) -> LayoutPayload {
    // The validator anchors its issues
    let issues = profiler.time_step("2. Layout Rules", || {
        LayoutValidator::new(config).validate(&extraction.elements)
    });
    info!(
        elements = extraction.elements.len(),
        layout_issues = issues.len(),
        parse_errors = extraction.parse_errors.len(),
        "layout analysis finished"
    );
    LayoutPayload::new(extraction, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(issue_type: &str, severity: Severity) -> Issue {
        Issue::document(issue_type, severity, "", "")
    }

    #[test]
    fn tags_follow_vocabulary_order_without_duplicates() {
        let issues = vec![
            issue(issue_types::HIERARCHY_FAULT, Severity::Warning),
            issue(issue_types::CITATION_REFERENCE_MISSING, Severity::Warning),
            issue(issue_types::REFERENCE_LIST_MISSING, Severity::Critical),
            issue(issue_types::TYPO_SUSPECTED, Severity::Info),
        ];
        assert_eq!(
            tags_for_issues(&issues),
            vec![audit_tags::CITATION_INCONSISTENCY, audit_tags::HIERARCHY_FAULT]
        );
        assert!(tags_for_issues(&[]).is_empty());
    }

    #[test]
    fn formula_issues_are_label_missing() {
        assert_eq!(tag_for_issue(issue_types::FORMULA_REF_MISSING), Some(audit_tags::LABEL_MISSING));
        assert_eq!(tag_for_issue(issue_types::FORMULA_MISALIGNED), None);
    }

    #[test]
    fn result_comment_reflects_issue_count() {
        let clean = AuditResult::from_issues(100, &[]);
        assert_eq!(clean.comment, "格式审计完成。");
        assert_eq!(clean.audit_level, Severity::Info);

        let issues = vec![
            issue(issue_types::LABEL_MISSING, Severity::Warning),
            issue(issue_types::PUNCTUATION_ERROR, Severity::Info),
        ];
        let result = AuditResult::from_issues(90, &issues);
        assert_eq!(result.comment, "发现 2 个格式问题。");
        assert_eq!(result.tags, vec![audit_tags::LABEL_MISSING, audit_tags::PUNCTUATION_ERROR]);
    }

    #[test]
    fn token_estimate_counts_characters() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("论文格式审计"), 1);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn request_validation() {
        let mut request = AuditRequest {
            request_id: "req-1".to_string(),
            metadata: RequestMetadata {
                paper_id: "p".to_string(),
                paper_title: "t".to_string(),
                chunk_id: "c".to_string(),
            },
            payload: RequestPayload {
                content: "正文".to_string(),
            },
        };
        assert!(request.validate().is_ok());
        request.payload.content.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn validation_anchors_issues_in_a_single_step() {
        let bbox = BoundingBox::new(50.0, 100.0, 400.0, 112.0);
        let extraction = Extraction {
            elements: vec![Element::new(ElementKind::Text, "结果见图1所示", bbox, 1, Region::Main)],
            ..Extraction::default()
        };
        let mut profiler = StepProfiler::new(true);

        let payload = validate_extraction(extraction, &RuleConfig::default(), &mut profiler);

        let steps: Vec<&str> = profiler.timings().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(steps, vec!["2. Layout Rules"]);
        assert_eq!(payload.layout_issues.len(), 1);
        let issue = &payload.layout_issues[0];
        assert_eq!(
            issue.anchor_id.as_deref(),
            Some(crate::anchors::anchor_id(issue_types::LABEL_MISSING, Some(1), Some(bbox)).as_str())
        );
        assert_eq!(issue.highlight, Some(bbox));
    }

    #[test]
    fn disabled_profiler_records_nothing() {
        let mut profiler = StepProfiler::new(false);
        assert_eq!(profiler.time_step("step", || 41 + 1), 42);
        assert!(profiler.timings().is_empty());

        let mut profiler = StepProfiler::new(true);
        profiler.time_step("step", || ());
        assert_eq!(profiler.timings().len(), 1);
    }
}
