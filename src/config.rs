// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub table_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    OpenAi,
    Voyage,
    Hash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Expected vector length; checked against every provider response when set.
    pub dimensions: Option<usize>,
    pub concurrency: usize,
    pub strip_punctuation: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub tokenizer_path: Option<PathBuf>,
    pub heuristic_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: GenerationProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub inter_document_delay_ms: u64,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failed document and keep summarizing the rest.
    #[default]
    Skip,
    /// Stop the batch at the first failed document.
    Abort,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub failure_policy: FailurePolicy,
    pub summary_prompt: Option<String>,
    pub feedback_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    pub papers_dir: PathBuf,
    pub parallel_workers: usize,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "data/lancedb".to_string(),
            table_name: "papers".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::OpenAi,
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            base_url: None,
            dimensions: None,
            concurrency: 4,
            strip_punctuation: false,
            timeout_secs: 60,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            tokenizer_path: None,
            heuristic_factor: 1.3,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::Gemini,
            model: "gemini-1.5-pro".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.3,
            max_output_tokens: 2048,
            max_attempts: 3,
            base_delay_ms: 2000,
            inter_document_delay_ms: 3000,
            requests_per_minute: 10,
            timeout_secs: 120,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            papers_dir: PathBuf::from("data/papers"),
            parallel_workers: 4,
            skip_patterns: vec![".git/*".to_string(), "*.json".to_string()],
            max_file_size_mb: 50,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PAPER_RAG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.fill_credentials(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Fills missing API keys from the conventional per-vendor variables.
    pub fn fill_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.embedding.api_key.is_none() {
            let var = match self.embedding.provider {
                EmbeddingProviderKind::OpenAi => Some("OPENAI_API_KEY"),
                EmbeddingProviderKind::Voyage => Some("VOYAGE_API_KEY"),
                EmbeddingProviderKind::Hash => None,
            };
            self.embedding.api_key = var.and_then(&lookup);
        }

        if self.generation.api_key.is_none() {
            self.generation.api_key = match self.generation.provider {
                GenerationProviderKind::Gemini => lookup("GOOGLE_API_KEY"),
                GenerationProviderKind::OpenAi => {
                    lookup("OPENAI_API_KEY").or_else(|| lookup("GROQ_API_KEY"))
                }
            };
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_tokens == 0 {
            return Err(PipelineError::Config(
                "chunking.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.chunking.heuristic_factor <= 0.0 {
            return Err(PipelineError::Config(
                "chunking.heuristic_factor must be positive".to_string(),
            ));
        }

        if self.retrieval.top_n == 0 {
            return Err(PipelineError::Config(
                "retrieval.top_n must be greater than 0".to_string(),
            ));
        }

        if self.generation.max_attempts == 0 {
            return Err(PipelineError::Config(
                "generation.max_attempts must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(PipelineError::Config(format!(
                "generation.temperature must be within [0, 2], got {}",
                self.generation.temperature
            )));
        }

        if self.generation.max_output_tokens == 0 {
            return Err(PipelineError::Config(
                "generation.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.embedding.concurrency == 0 {
            return Err(PipelineError::Config(
                "embedding.concurrency must be greater than 0".to_string(),
            ));
        }

        if self.ingest.parallel_workers == 0 {
            return Err(PipelineError::Config(
                "ingest.parallel_workers must be greater than 0".to_string(),
            ));
        }

        for base_url in [&self.embedding.base_url, &self.generation.base_url]
            .into_iter()
            .flatten()
        {
            Validator::validate_url(base_url).map_err(|e| PipelineError::Config(e.to_string()))?;
        }

        if self.store.table_name.trim().is_empty() {
            return Err(PipelineError::Config(
                "store.table_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
