// file: src/embedding/hash.rs
// description: deterministic offline embedding provider for development and tests
// reference: https://docs.rs/sha2

use crate::embedding::provider::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Derives a unit-length vector from SHA-256 digests of the text. Carries no
/// semantics; only selected explicitly through `embedding.provider = "hash"`.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn generate(&self, text: &str) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.dimensions);
        let mut block = 0u32;

        while values.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(block.to_le_bytes());
            hasher.update(text.as_bytes());
            let digest = hasher.finalize();

            for pair in digest.chunks_exact(2) {
                if values.len() == self.dimensions {
                    break;
                }
                let raw = u16::from_le_bytes([pair[0], pair[1]]);
                values.push(raw as f32 / u16::MAX as f32 * 2.0 - 1.0);
            }
            block += 1;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed_chunk(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn name(&self) -> &str {
        "hash"
    }
}
