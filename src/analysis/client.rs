//! Analysis service seam + Gemini HTTP client
//!
//! The pipeline only depends on [`AnalysisService`]; the client is a thin
//! `reqwest` wrapper that builds the request and unwraps the response
//! envelope. Payload decoding lives in `payload.rs`.

use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::error::AnalysisError;

/// Something that turns raw document text into the model's raw reply.
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    async fn analyze(&self, text: &str) -> Result<String, AnalysisError>;
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const PROMPT_HEADER: &str = r#"You are reading a research paper. Produce one JSON object and nothing else.

Fields:
- "paper_summary": a plain-language summary of the contribution, method and findings.
- "section_analysis": one entry per main section (include the abstract if present), each
  {"section_title": <title exactly as printed>, "section_summary": <short summary>}.
- "keywords": important technical terms and acronyms, each {"term": ..., "definition": <one sentence>}.
- "people": authors and other people mentioned, each {"name": ..., "description": <one sentence>}.
- "emails": every email address that appears in the text.

Document text:
---
"#;

/// Prompt sent to the model, embedding the truncated document text
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let mut prompt = String::with_capacity(PROMPT_HEADER.len() + text.len().min(max_chars * 4));
    prompt.push_str(PROMPT_HEADER);
    prompt.push_str(truncate_chars(text, max_chars));
    prompt
}

/// Pull `candidates[0].content.parts[0].text` out of a response envelope
pub fn candidate_text(envelope: &Value) -> Result<String, AnalysisError> {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(AnalysisError::InvalidEnvelope)
}

// =============================================================================
// GeminiClient
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    config: ServiceConfig,
    max_chars: usize,
}

impl GeminiClient {
    pub fn new(config: ServiceConfig, max_chars: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            max_chars,
        }
    }

    /// JSON body of the generateContent request
    pub fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(text, self.max_chars) }]
            }]
        })
    }
}

impl AnalysisService for GeminiClient {
    async fn analyze(&self, text: &str) -> Result<String, AnalysisError> {
        let response = self
            .http
            .post(self.config.request_url())
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;
        candidate_text(&envelope)
    }
}
