// file: src/embedding/client.rs
// description: text to single document vector, chunking and averaging long inputs
// reference: https://docs.rs/futures

use crate::config::Config;
use crate::embedding::provider::{EmbeddingProvider, provider_from_config};
use crate::error::{PipelineError, Result};
use crate::text::{TextChunker, TextNormalizer, counter_from_config};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    normalizer: TextNormalizer,
    chunker: TextChunker,
    max_tokens: usize,
    concurrency: usize,
    expected_dimensions: Option<usize>,
}

impl EmbeddingClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        normalizer: TextNormalizer,
        chunker: TextChunker,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            normalizer,
            chunker,
            max_tokens,
            concurrency: 1,
            expected_dimensions: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = provider_from_config(&config.embedding)?;
        let chunker = TextChunker::new(counter_from_config(&config.chunking));
        let normalizer = TextNormalizer::new(config.embedding.strip_punctuation);

        Ok(Self::new(provider, normalizer, chunker, config.chunking.max_tokens)
            .with_concurrency(config.embedding.concurrency)
            .with_expected_dimensions(config.embedding.dimensions))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_expected_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.expected_dimensions = dimensions;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Embeds a whole document. Text over the token budget is chunked, each
    /// chunk embedded, and the chunk vectors averaged element-wise.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = self.normalizer.normalize(text);
        if normalized.is_empty() {
            return Err(PipelineError::Validation(
                "Cannot embed empty text".to_string(),
            ));
        }

        let tokens = self.chunker.count_tokens(&normalized);
        if tokens <= self.max_tokens {
            debug!("Embedding {} tokens in a single request", tokens);
            let embedding = self.embed_one(0, &normalized, tokens).await?;
            self.check_dimensions(&embedding)?;
            return Ok(embedding);
        }

        let chunks = self.chunker.chunk(&normalized, self.max_tokens);
        info!(
            "Text of {} tokens exceeds budget {}, embedding {} chunks",
            tokens,
            self.max_tokens,
            chunks.len()
        );

        let vectors: Vec<Vec<f32>> = stream::iter(chunks.iter().enumerate().map(
            |(index, chunk)| async move {
                let chunk_tokens = self.chunker.count_tokens(chunk);
                self.embed_one(index, chunk, chunk_tokens).await
            },
        ))
        .buffered(self.concurrency)
        .try_collect()
        .await?;

        let embedding = Self::mean_embedding(&vectors)?;
        self.check_dimensions(&embedding)?;
        Ok(embedding)
    }

    async fn embed_one(&self, index: usize, chunk: &str, tokens: usize) -> Result<Vec<f32>> {
        let prepared = self.normalizer.prepare_for_embedding(chunk);

        self.provider
            .embed_chunk(&prepared)
            .await
            .map_err(|e| PipelineError::EmbeddingChunk {
                index,
                chars: chunk.chars().count(),
                tokens,
                source: Box::new(e),
            })
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        match self.expected_dimensions {
            Some(expected) if expected != embedding.len() => {
                Err(PipelineError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Element-wise arithmetic mean; every vector must have the same length.
    pub fn mean_embedding(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
        let first = vectors.first().ok_or_else(|| {
            PipelineError::Validation("Cannot average zero embeddings".to_string())
        })?;

        let dimensions = first.len();
        let mut sum = vec![0.0f32; dimensions];

        for vector in vectors {
            if vector.len() != dimensions {
                return Err(PipelineError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            for (acc, value) in sum.iter_mut().zip(vector) {
                *acc += value;
            }
        }

        let count = vectors.len() as f32;
        sum.iter_mut().for_each(|v| *v /= count);
        Ok(sum)
    }
}
