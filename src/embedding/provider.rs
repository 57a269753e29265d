// file: src/embedding/provider.rs
// description: embedding backend capability and config-driven selection
// reference: https://docs.rs/async-trait

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::embedding::hash::HashEmbeddingProvider;
use crate::embedding::remote::RemoteEmbeddingProvider;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// A backend that turns one chunk of text (already within the model's
/// input limit) into a vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_chunk(&self, text: &str) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::OpenAi => Arc::new(RemoteEmbeddingProvider::openai(config)?),
        EmbeddingProviderKind::Voyage => Arc::new(RemoteEmbeddingProvider::voyage(config)?),
        EmbeddingProviderKind::Hash => {
            let dimensions = config.dimensions.ok_or_else(|| {
                PipelineError::Config(
                    "embedding.dimensions is required for the hash provider".to_string(),
                )
            })?;
            Arc::new(HashEmbeddingProvider::new(dimensions))
        }
    };

    info!(
        "Embedding provider: {} (model {})",
        provider.name(),
        config.model
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_provider_requires_dimensions() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Hash,
            dimensions: None,
            ..EmbeddingConfig::default()
        };
        assert!(provider_from_config(&config).is_err());
    }

    #[test]
    fn test_remote_provider_requires_key() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Voyage,
            api_key: None,
            ..EmbeddingConfig::default()
        };
        assert!(provider_from_config(&config).is_err());
    }

    #[test]
    fn test_select_hash_provider() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Hash,
            dimensions: Some(16),
            ..EmbeddingConfig::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "hash");
    }
}
