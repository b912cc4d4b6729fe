use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{info, warn};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_right_align_ratio() -> f32 {
    0.85
}

fn default_max_typos_total_warning() -> usize {
    10
}

/// Rule parameters for every layout and semantic checker, keyed by checker name.
///
/// Loaded from YAML; every section and field falls back to its default so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    // Layout checkers
    pub chart_check: ToggleConfig,
    pub formula_check: FormulaCheckConfig,
    pub heading_check: ToggleConfig,
    pub citation_visual_check: ToggleConfig,

    // Semantic checkers
    pub typo_check: TypoCheckConfig,
    pub terminology_check: TerminologyCheckConfig,
    pub punctuation_check: PunctuationCheckConfig,
    pub citation_check: CitationCheckConfig,
}

/// Section for checkers whose only parameter is whether they run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// A numbered formula whose right edge is below this fraction of the
    /// page's rightmost observed edge is reported as misaligned
    #[serde(default = "default_right_align_ratio")]
    pub right_align_ratio: f32,
}

impl Default for FormulaCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            right_align_ratio: default_right_align_ratio(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypoCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// More suspected typos than this raises one document-level warning
    #[serde(default = "default_max_typos_total_warning")]
    pub max_typos_total_warning: usize,
    /// Terms whose misspelling is critical
    #[serde(default)]
    pub critical_keywords: Vec<String>,
    /// Misspelling -> correction
    #[serde(default)]
    pub known_typos: BTreeMap<String, String>,
}

impl Default for TypoCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_typos_total_warning: default_max_typos_total_warning(),
            critical_keywords: Vec::new(),
            known_typos: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminologyCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Canonical term -> accepted spellings of the same concept
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<String>>,
    /// Canonical term -> spellings that must never appear
    #[serde(default)]
    pub forbidden_variants: BTreeMap<String, Vec<String>>,
}

impl Default for TerminologyCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            terms: BTreeMap::new(),
            forbidden_variants: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunctuationCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub allow_mixed_punctuation: bool,
}

impl Default for PunctuationCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_mixed_punctuation: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationStyle {
    /// Bracketed numeric citations, e.g. `[3]`
    #[serde(alias = "ieee", alias = "numeric", alias = "Numeric")]
    IEEE,
    /// Parenthesized author-year citations, e.g. `(Smith, 2020)`
    #[serde(alias = "apa", alias = "author-year", alias = "AuthorYear")]
    APA,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_citation_style")]
    pub style: CitationStyle,
}

fn default_citation_style() -> CitationStyle {
    CitationStyle::IEEE
}

impl Default for CitationCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: default_citation_style(),
        }
    }
}

impl RuleConfig {
    /// Load config from file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

// ===== HOT-RELOADABLE RULE STORE =====

/// Process-wide holder of the active [`RuleConfig`] generation.
///
/// Readers take an `Arc` snapshot and keep it for the whole request; `reload`
/// builds a complete new value and swaps the single reference, so a reader
/// never observes a half-updated configuration.
#[derive(Debug)]
pub struct RuleStore {
    path: Option<PathBuf>,
    active: RwLock<Arc<RuleConfig>>,
}

impl RuleStore {
    /// Store holding `config` with no backing file; `reload` is a no-op.
    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            path: None,
            active: RwLock::new(Arc::new(config)),
        }
    }

    /// Load rules from `path`. A missing file yields the built-in defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Self::read_generation(&path)?;
        Ok(Self {
            path: Some(path),
            active: RwLock::new(Arc::new(config)),
        })
    }

    /// Current generation. Cheap: clones the `Arc`, not the config.
    pub fn current(&self) -> Arc<RuleConfig> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            // A writer only ever swaps a fully built Arc, so the value behind
            // a poisoned lock is still a complete generation
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the backing file and swap in the new generation.
    /// On error the previous generation stays active.
    pub fn reload(&self) -> Result<Arc<RuleConfig>, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(self.current());
        };
        let fresh = Arc::new(Self::read_generation(path)?);
        self.replace(Arc::clone(&fresh));
        info!(path = %path.display(), "rule config reloaded");
        Ok(fresh)
    }

    /// Swap in an already-built generation.
    pub fn replace(&self, config: Arc<RuleConfig>) {
        match self.active.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    fn read_generation(path: &Path) -> Result<RuleConfig, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "rule config not found, using built-in defaults");
            return Ok(RuleConfig::default());
        }
        RuleConfig::load_from_file(path)
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::with_config(RuleConfig::default())
    }
}

// ===== PROCESS SETTINGS =====

pub const AGENT_NAME: &str = "Standardization_Auditor_Agent";
pub const AGENT_VERSION: &str = "v1.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    None,
    Qwen,
    Gemini,
}

impl LlmProvider {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "qwen" => LlmProvider::Qwen,
            "gemini" => LlmProvider::Gemini,
            _ => LlmProvider::None,
        }
    }
}

/// Environment-driven process settings (timeouts, advisory provider).
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub log_level: String,
    pub llm_provider: LlmProvider,
    pub llm_timeout: Duration,
    pub layout_timeout: Duration,
    pub qwen_api_key: String,
    pub qwen_base_url: String,
    pub qwen_model_name: String,
    pub google_api_key: String,
    pub gemini_model_name: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            llm_provider: LlmProvider::None,
            llm_timeout: Duration::from_secs(8),
            layout_timeout: Duration::from_secs(5),
            qwen_api_key: String::new(),
            qwen_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            qwen_model_name: "qwen-plus".to_string(),
            google_api_key: String::new(),
            gemini_model_name: "gemini-1.5-flash".to_string(),
        }
    }
}

impl AgentSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or malformed values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            log_level: lookup("LOG_LEVEL")
                .map(|v| v.to_uppercase())
                .unwrap_or(defaults.log_level),
            llm_provider: lookup("LLM_PROVIDER")
                .map(|v| LlmProvider::parse(&v))
                .unwrap_or(defaults.llm_provider),
            llm_timeout: secs("LLM_TIMEOUT_SEC", defaults.llm_timeout),
            layout_timeout: secs("LAYOUT_TIMEOUT_SEC", defaults.layout_timeout),
            qwen_api_key: lookup("QWEN_API_KEY").unwrap_or(defaults.qwen_api_key),
            qwen_base_url: lookup("QWEN_BASE_URL").unwrap_or(defaults.qwen_base_url),
            qwen_model_name: lookup("QWEN_MODEL_NAME").unwrap_or(defaults.qwen_model_name),
            google_api_key: lookup("GOOGLE_API_KEY").unwrap_or(defaults.google_api_key),
            gemini_model_name: lookup("GEMINI_MODEL_NAME").unwrap_or(defaults.gemini_model_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
citation_check:
  style: APA
formula_check:
  right_align_ratio: 0.9
"#;
        let config = RuleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.citation_check.style, CitationStyle::APA);
        assert!(config.citation_check.enabled);
        assert!((config.formula_check.right_align_ratio - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.typo_check.max_typos_total_warning, 10);
        assert!(config.chart_check.enabled);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(RuleConfig::from_yaml("  \n").unwrap(), RuleConfig::default());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = RuleStore::load("/definitely/not/here/rules.yaml").unwrap();
        assert_eq!(*store.current(), RuleConfig::default());
    }

    #[test]
    fn reload_swaps_generation_and_keeps_old_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "citation_check:\n  style: IEEE\n").unwrap();

        let store = RuleStore::load(&path).unwrap();
        let before = store.current();
        assert_eq!(before.citation_check.style, CitationStyle::IEEE);

        std::fs::write(&path, "citation_check:\n  style: APA\n").unwrap();
        store.reload().unwrap();

        assert_eq!(store.current().citation_check.style, CitationStyle::APA);
        // A reader holding the old generation still sees a complete, unchanged value
        assert_eq!(before.citation_check.style, CitationStyle::IEEE);
    }

    #[test]
    fn failed_reload_keeps_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "citation_check:\n  style: APA\n").unwrap();
        let store = RuleStore::load(&path).unwrap();

        std::fs::write(&path, "citation_check: [unclosed").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.current().citation_check.style, CitationStyle::APA);
    }

    #[test]
    fn shipped_rules_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../rules.yaml");
        let config = RuleConfig::load_from_file(&path).unwrap();
        assert_eq!(config.citation_check.style, CitationStyle::IEEE);
        assert_eq!(config.typo_check.known_typos.get("recieve").map(String::as_str), Some("receive"));
        assert!(config.terminology_check.terms.contains_key("卷积神经网络"));
    }

    #[test]
    fn settings_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("LLM_PROVIDER", "Qwen"),
            ("LLM_TIMEOUT_SEC", "3"),
            ("LAYOUT_TIMEOUT_SEC", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let settings = AgentSettings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.llm_provider, LlmProvider::Qwen);
        assert_eq!(settings.llm_timeout, Duration::from_secs(3));
        assert_eq!(settings.layout_timeout, Duration::from_secs(5));
        assert_eq!(settings.qwen_model_name, "qwen-plus");
    }
}
