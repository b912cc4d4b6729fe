//! LLM advisory pass
//!
//! A free-form review of the resolved text by an external chat model. The
//! output is opaque feedback carried next to the issues, never parsed. Every
//! failure mode (no provider, missing key, HTTP error, timeout) degrades to an
//! empty string through [`advise_with_timeout`].

use crate::config::{AgentSettings, LlmProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "你是学术论文格式审计助手。请检查给定论文片段中的格式问题，\
包括引用格式、图表标注、公式编号、标题层级、术语与标点，逐条给出简短的修改建议。";

const TEMPERATURE: f64 = 0.1;
const QWEN_MAX_TOKENS: u32 = 2000;
const GEMINI_MAX_OUTPUT_TOKENS: u32 = 8192;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[async_trait]
pub trait LlmAdvisor: Send + Sync {
    /// Free-form audit feedback for `content`
    async fn scan_document(&self, content: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Provider `none`: no network call, empty feedback.
pub struct DisabledAdvisor;

#[async_trait]
impl LlmAdvisor for DisabledAdvisor {
    async fn scan_document(&self, _content: &str) -> Result<String> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Build the advisor selected by `LLM_PROVIDER`. A provider without an API key
/// falls back to [`DisabledAdvisor`].
pub fn advisor_from_settings(settings: &AgentSettings) -> Box<dyn LlmAdvisor> {
    match settings.llm_provider {
        LlmProvider::None => Box::new(DisabledAdvisor),
        LlmProvider::Qwen if settings.qwen_api_key.is_empty() => {
            warn!("QWEN_API_KEY is not set, LLM advisory pass disabled");
            Box::new(DisabledAdvisor)
        }
        LlmProvider::Qwen => Box::new(OpenAiCompatibleAdvisor::new(
            &settings.qwen_api_key,
            &settings.qwen_base_url,
            &settings.qwen_model_name,
        )),
        LlmProvider::Gemini if settings.google_api_key.is_empty() => {
            warn!("GOOGLE_API_KEY is not set, LLM advisory pass disabled");
            Box::new(DisabledAdvisor)
        }
        LlmProvider::Gemini => Box::new(GeminiAdvisor::new(
            &settings.google_api_key,
            &settings.gemini_model_name,
        )),
    }
}

/// Run the advisor under a hard deadline. Never fails: errors and timeouts
/// are logged and become an empty string.
pub async fn advise_with_timeout(advisor: &dyn LlmAdvisor, content: &str, timeout: Duration) -> String {
    match tokio::time::timeout(timeout, advisor.scan_document(content)).await {
        Ok(Ok(feedback)) => {
            debug!(advisor = advisor.name(), chars = feedback.len(), "LLM feedback received");
            feedback
        }
        Ok(Err(e)) => {
            warn!(advisor = advisor.name(), error = %e, "LLM advisory pass failed");
            String::new()
        }
        Err(_) => {
            warn!(advisor = advisor.name(), timeout_ms = timeout.as_millis() as u64, "LLM advisory pass timed out");
            String::new()
        }
    }
}

// ===== OPENAI-COMPATIBLE (QWEN / DASHSCOPE) =====

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiCompatibleAdvisor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatibleAdvisor {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmAdvisor for OpenAiCompatibleAdvisor {
    async fn scan_document(&self, content: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: QWEN_MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completion API error ({status}): {error_text}");
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ===== GEMINI =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmAdvisor for GeminiAdvisor {
    async fn scan_document(&self, content: &str) -> Result<String> {
        let request = GenerateRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: SYSTEM_PROMPT }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: content }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: GEMINI_MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model))
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .context("Failed to send generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse generateContent response")?;
        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct SlowAdvisor;

    #[async_trait]
    impl LlmAdvisor for SlowAdvisor {
        async fn scan_document(&self, _content: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct FailingAdvisor;

    #[async_trait]
    impl LlmAdvisor for FailingAdvisor {
        async fn scan_document(&self, _content: &str) -> Result<String> {
            Err(anyhow!("connection refused"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct EchoAdvisor;

    #[async_trait]
    impl LlmAdvisor for EchoAdvisor {
        async fn scan_document(&self, content: &str) -> Result<String> {
            Ok(format!("reviewed {} chars", content.chars().count()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn timeout_degrades_to_empty() {
        let feedback = advise_with_timeout(&SlowAdvisor, "text", Duration::from_millis(20)).await;
        assert_eq!(feedback, "");
    }

    #[tokio::test]
    async fn failure_degrades_to_empty() {
        let feedback = advise_with_timeout(&FailingAdvisor, "text", Duration::from_secs(1)).await;
        assert_eq!(feedback, "");
    }

    #[tokio::test]
    async fn success_passes_feedback_through() {
        let feedback = advise_with_timeout(&EchoAdvisor, "正文", Duration::from_secs(1)).await;
        assert_eq!(feedback, "reviewed 2 chars");
    }

    #[test]
    fn provider_without_key_is_disabled() {
        let settings = AgentSettings {
            llm_provider: LlmProvider::Qwen,
            ..AgentSettings::default()
        };
        assert_eq!(advisor_from_settings(&settings).name(), "disabled");

        let settings = AgentSettings {
            llm_provider: LlmProvider::Qwen,
            qwen_api_key: "sk-test".to_string(),
            ..AgentSettings::default()
        };
        assert_eq!(advisor_from_settings(&settings).name(), "qwen-plus");
    }
}
