// file: src/text/tokenizer.rs
// description: token counting for chunk budgets, exact via tokenizer.json or heuristic
// reference: https://docs.rs/tokenizers

use crate::config::ChunkingConfig;
use crate::error::{PipelineError, Result};
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{info, warn};

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    fn name(&self) -> &str;
}

/// Word count scaled by a constant factor. Used when no tokenizer matching
/// the embedding model is available.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    factor: f64,
}

impl HeuristicTokenCounter {
    pub const DEFAULT_FACTOR: f64 = 1.3;

    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words as f64 * self.factor).ceil() as usize
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

pub struct HuggingFaceTokenCounter {
    tokenizer: Tokenizer,
    fallback: HeuristicTokenCounter,
}

impl HuggingFaceTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to load tokenizer from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            tokenizer,
            fallback: HeuristicTokenCounter::default(),
        })
    }
}

impl TokenCounter for HuggingFaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                warn!("Tokenizer failed ({}), estimating token count instead", e);
                self.fallback.count(text)
            }
        }
    }

    fn name(&self) -> &str {
        "tokenizer"
    }
}

/// Exact counting when a tokenizer file is configured and loads, otherwise
/// the heuristic.
pub fn counter_from_config(config: &ChunkingConfig) -> Arc<dyn TokenCounter> {
    if let Some(path) = &config.tokenizer_path {
        match HuggingFaceTokenCounter::from_file(path) {
            Ok(counter) => {
                info!("Using tokenizer {} for token counting", path.display());
                return Arc::new(counter);
            }
            Err(e) => warn!("{}; falling back to heuristic token counting", e),
        }
    } else {
        warn!(
            "No tokenizer configured, estimating tokens as words x {}",
            config.heuristic_factor
        );
    }

    Arc::new(HeuristicTokenCounter::new(config.heuristic_factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_heuristic_count() {
        let counter = HeuristicTokenCounter::default();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("one"), 2);
        assert_eq!(counter.count("one two three four five six seven eight nine ten"), 13);
    }

    #[test]
    fn test_custom_factor() {
        let counter = HeuristicTokenCounter::new(1.0);
        assert_eq!(counter.count("a b  c\n d"), 4);
    }

    #[test]
    fn test_missing_tokenizer_falls_back() {
        let config = ChunkingConfig {
            max_tokens: 100,
            tokenizer_path: Some(PathBuf::from("/nonexistent/tokenizer.json")),
            heuristic_factor: 1.0,
        };
        let counter = counter_from_config(&config);
        assert_eq!(counter.name(), "heuristic");
        assert_eq!(counter.count("a b c"), 3);
    }
}
