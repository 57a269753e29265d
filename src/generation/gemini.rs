// file: src/generation/gemini.rs
// description: Google Generative Language generateContent backend
// reference: https://ai.google.dev/api/generate-content

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

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
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

pub struct GeminiModel {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = require_api_key(config, PROVIDER)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/');

        Ok(Self {
            client,
            endpoint: format!("{}/models/{}:generateContent", base_url, config.model),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system_prompt,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.user_content,
                }],
            }],
            generation_config: GenerationSettings {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            PipelineError::GenerativeRequest {
                provider: PROVIDER.to_string(),
                message: "Response contained no candidates".to_string(),
            }
        })?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PipelineError::GenerativeRequest {
                provider: PROVIDER.to_string(),
                message: format!(
                    "Empty response (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            "Requesting generation from gemini for {} chars",
            request.user_content.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(request))
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

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::GenerativeRequest {
                    provider: PROVIDER.to_string(),
                    message: format!("Failed to parse response: {}", e),
                })?;

        Self::extract_text(parsed)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig {
            api_key: Some("g-key".to_string()),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_endpoint_includes_model() {
        let model = GeminiModel::new(&config()).unwrap();
        assert_eq!(
            model.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new("You review papers.", "Paper text").with_sampling(0.2, 512);
        let json = serde_json::to_value(GeminiModel::build_body(&request)).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You review papers.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Paper text");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(GeminiModel::extract_text(parsed).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_text_rejects_blocked_response() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let err = GeminiModel::extract_text(parsed).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
        assert!(!err.is_transient());
    }
}
