// file: src/embedding/remote.rs
// description: OpenAI-compatible and Voyage embedding APIs over HTTP
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::EmbeddingConfig;
use crate::embedding::provider::EmbeddingProvider;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const VOYAGE_BASE_URL: &str = "https://api.voyageai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Both vendors accept `{input, model}` and answer with `data[].embedding`;
/// Voyage additionally takes an `input_type` hint.
pub struct RemoteEmbeddingProvider {
    client: Client,
    vendor: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
    input_type: Option<String>,
}

impl RemoteEmbeddingProvider {
    pub fn openai(config: &EmbeddingConfig) -> Result<Self> {
        Self::build("openai", OPENAI_BASE_URL, None, config)
    }

    pub fn voyage(config: &EmbeddingConfig) -> Result<Self> {
        Self::build("voyage", VOYAGE_BASE_URL, Some("document"), config)
    }

    fn build(
        vendor: &'static str,
        default_base_url: &str,
        input_type: Option<&str>,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config(format!("embedding.api_key is required for {}", vendor))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(default_base_url)
            .trim_end_matches('/');

        Ok(Self {
            client,
            vendor,
            endpoint: format!("{}/embeddings", base_url),
            api_key,
            model: config.model.clone(),
            input_type: input_type.map(str::to_string),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, message: String) -> PipelineError {
        PipelineError::EmbeddingRequest {
            provider: self.vendor.to_string(),
            message,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed_chunk(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.model,
            input_type: self.input_type.as_deref(),
        };

        debug!(
            "Requesting embedding from {} for {} chars",
            self.vendor,
            text.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(self.request_error(format!(
                "Request failed with status {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(format!("Failed to parse response: {}", e)))?;

        match parsed.data.into_iter().next() {
            Some(data) if !data.embedding.is_empty() => {
                debug!("Received embedding of dimension {}", data.embedding.len());
                Ok(data.embedding)
            }
            _ => Err(self.request_error("No embedding data returned".to_string())),
        }
    }

    fn name(&self) -> &str {
        self.vendor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.map(str::to_string),
            ..EmbeddingConfig::default()
        }
    }

    #[test]
    fn test_default_endpoints() {
        let openai = RemoteEmbeddingProvider::openai(&config(None)).unwrap();
        assert_eq!(openai.endpoint(), "https://api.openai.com/v1/embeddings");

        let voyage = RemoteEmbeddingProvider::voyage(&config(None)).unwrap();
        assert_eq!(voyage.endpoint(), "https://api.voyageai.com/v1/embeddings");
        assert_eq!(voyage.name(), "voyage");
    }

    #[test]
    fn test_custom_base_url_for_compatible_vendor() {
        let groq =
            RemoteEmbeddingProvider::openai(&config(Some("https://api.groq.com/openai/v1/")))
                .unwrap();
        assert_eq!(groq.endpoint(), "https://api.groq.com/openai/v1/embeddings");
    }

    #[test]
    fn test_blank_key_rejected() {
        let mut cfg = config(None);
        cfg.api_key = Some("   ".to_string());
        assert!(RemoteEmbeddingProvider::openai(&cfg).is_err());
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbeddingRequest {
            input: vec!["hello"],
            model: "voyage-3.5",
            input_type: Some("document"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["input_type"], "document");

        let request = EmbeddingRequest {
            input: vec!["hello"],
            model: "text-embedding-3-small",
            input_type: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("input_type").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2,0.3]}],"model":"m"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2, 0.3]);
    }
}
