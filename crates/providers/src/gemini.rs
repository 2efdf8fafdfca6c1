//! Google Gemini provider implementation.
//!
//! Uses the Generative Language API directly:
//! - `x-goog-api-key` header authentication
//! - `models/{model}:streamGenerateContent?alt=sse` for streaming
//! - Text is read from `candidates[0].content.parts[*].text`
//! - Thought parts (thinking models) are skipped

use async_trait::async_trait;
use genweb_core::error::ProviderError;
use genweb_core::provider::*;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::sse::{self, Payload};

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini streaming provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_default();

        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Streaming endpoint for `model`. Accepts both `gemini-2.5-flash`
    /// and the fully qualified `models/gemini-2.5-flash`.
    fn stream_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }

        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: GenerationRequest) -> Result<GenerationStream, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key missing, set GEMINI_API_KEY or api_key in config".into(),
            ));
        }

        let url = self.stream_url(&request.model);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = sse::check_status(&self.name, response).await?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let fragments = sse::spawn_pump(self.name.clone(), response, parse_payload);

        Ok(GenerationStream { run_id, fragments })
    }
}

/// Interpret one `data:` payload of a Gemini stream.
fn parse_payload(data: &str) -> Result<Payload, serde_json::Error> {
    let chunk: StreamResponse = serde_json::from_str(data)?;

    if let Some(reason) = chunk
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Ok(Payload::Error(ProviderError::ApiError {
            status_code: 200,
            message: format!("Prompt blocked by provider: {reason}"),
        }));
    }

    if let Some(id) = &chunk.response_id {
        trace!(response_id = %id, "Gemini chunk");
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(Payload::Ignore);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        Ok(Payload::Ignore)
    } else {
        Ok(Payload::Text(text))
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
