//! Provider trait: the abstraction over text-generation backends.
//!
//! A Provider takes a single prompt and returns a live stream of text
//! fragments, tagged with an identifier for the generation run.
//!
//! Implementations: Gemini, OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;

/// Receiving half of a fragment stream.
///
/// Dropping it tells the producer the consumer has gone away; producers
/// stop reading upstream as soon as a send fails.
pub type FragmentReceiver = mpsc::Receiver<Result<String, ProviderError>>;

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "gemini-2.5-flash", "gpt-4o")
    pub model: String,

    /// The fully composed prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A live generation: the run identifier plus the ordered fragments.
///
/// The channel closes when the provider finishes. A provider failure
/// after the stream has started arrives as an `Err` item, after which
/// no further fragments are sent.
#[derive(Debug)]
pub struct GenerationStream {
    pub run_id: String,
    pub fragments: FragmentReceiver,
}

/// The core Provider trait.
///
/// The gateway calls `stream()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a stream of text fragments.
    ///
    /// Errors returned here happen before any fragment is produced
    /// (connection refused, bad credentials, non-200 status).
    async fn stream(&self, request: GenerationRequest) -> Result<GenerationStream, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_request_defaults() {
        let req = GenerationRequest::new("gemini-2.5-flash", "Build a page");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn builder_sets_limits() {
        let req = GenerationRequest::new("gpt-4o", "hi")
            .with_temperature(0.2)
            .with_max_tokens(512);
        assert!((req.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, Some(512));
    }

    #[test]
    fn max_tokens_omitted_when_unset() {
        let req = GenerationRequest::new("m", "p");
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(json.contains("\"prompt\":\"p\""));
    }
}
