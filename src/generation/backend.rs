// file: src/generation/backend.rs
// description: generative model abstraction and failure classification
// reference: https://docs.rs/async-trait

use crate::config::{GenerationConfig, GenerationProviderKind};
use crate::error::{PipelineError, Result};
use crate::generation::gemini::GeminiModel;
use crate::generation::openai::OpenAiChatModel;
use async_trait::async_trait;
use std::sync::Arc;

/// Status codes that signal rate limiting or temporary overload.
const TRANSIENT_STATUSES: [u16; 4] = [429, 500, 503, 529];

/// Body fragments that signal rate limiting regardless of status code.
const TRANSIENT_MARKERS: [&str; 3] = ["resource_exhausted", "overloaded", "rate limit"];

/// Status reported for requests that timed out before any response.
pub const TIMEOUT_STATUS: u16 = 408;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: user_content.into(),
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// One request, no retries. Rate-limit and overload failures come back as
    /// `GenerativeTransient`, everything else as `GenerativeRequest`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn name(&self) -> &str;
}

pub fn model_from_config(config: &GenerationConfig) -> Result<Arc<dyn GenerativeModel>> {
    match config.provider {
        GenerationProviderKind::Gemini => Ok(Arc::new(GeminiModel::new(config)?)),
        GenerationProviderKind::OpenAi => Ok(Arc::new(OpenAiChatModel::new(config)?)),
    }
}

pub fn is_transient_response(status: u16, body: &str) -> bool {
    if TRANSIENT_STATUSES.contains(&status) {
        return true;
    }

    let lowered = body.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Maps a non-success HTTP response to the matching error variant.
pub fn classify_failure(provider: &str, status: u16, body: &str) -> PipelineError {
    if is_transient_response(status, body) {
        PipelineError::GenerativeTransient {
            provider: provider.to_string(),
            status,
            message: body.to_string(),
        }
    } else {
        PipelineError::GenerativeRequest {
            provider: provider.to_string(),
            message: format!("Request failed with status {}: {}", status, body),
        }
    }
}

pub fn classify_send_error(provider: &str, err: &reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::GenerativeTransient {
            provider: provider.to_string(),
            status: TIMEOUT_STATUS,
            message: format!("Request timed out: {}", err),
        }
    } else {
        PipelineError::GenerativeRequest {
            provider: provider.to_string(),
            message: format!("Failed to send request: {}", err),
        }
    }
}

pub(crate) fn require_api_key(config: &GenerationConfig, provider: &str) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            PipelineError::Config(format!("generation.api_key is required for {}", provider))
        })
}
