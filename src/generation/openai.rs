// file: src/generation/openai.rs
// description: OpenAI-compatible chat completions backend (OpenAI, Groq)
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::GenerationConfig;
use crate::error::{PipelineError, Result};
use crate::generation::backend::{
    GenerationRequest, GenerativeModel, classify_failure, classify_send_error, require_api_key,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = require_api_key(config, PROVIDER)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_BASE_URL)
            .trim_end_matches('/');

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_content,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        }
    }
}

#[async_trait]
impl GenerativeModel for OpenAiChatModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            "Requesting chat completion from {} for {} chars",
            self.model,
            request.user_content.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| classify_send_error(PROVIDER, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_failure(PROVIDER, status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::GenerativeRequest {
                    provider: PROVIDER.to_string(),
                    message: format!("Failed to parse response: {}", e),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PipelineError::GenerativeRequest {
                provider: PROVIDER.to_string(),
                message: "Response contained no message content".to_string(),
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationProviderKind;

    fn config(base_url: Option<&str>) -> GenerationConfig {
        GenerationConfig {
            provider: GenerationProviderKind::OpenAi,
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: Some("gsk-test".to_string()),
            base_url: base_url.map(str::to_string),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_endpoints() {
        let openai = OpenAiChatModel::new(&config(None)).unwrap();
        assert_eq!(openai.endpoint(), "https://api.openai.com/v1/chat/completions");

        let groq = OpenAiChatModel::new(&config(Some("https://api.groq.com/openai/v1/"))).unwrap();
        assert_eq!(groq.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let model = OpenAiChatModel::new(&config(None)).unwrap();
        let request = GenerationRequest::new("system", "user text").with_sampling(0.5, 100);
        let json = serde_json::to_value(model.build_body(&request)).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "user text");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Summary."},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Summary."));
    }
}
