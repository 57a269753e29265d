// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Text extraction failed for {file}: {message}")]
    Extraction { file: String, message: String },

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Embedding request to {provider} failed: {message}")]
    EmbeddingRequest { provider: String, message: String },

    #[error("Embedding failed for chunk {index} ({chars} chars, {tokens} tokens): {source}")]
    EmbeddingChunk {
        index: usize,
        chars: usize,
        tokens: usize,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector store write failed: {0}")]
    StoreWrite(String),

    #[error("Vector store query failed: {0}")]
    StoreQuery(String),

    #[error("Transient generation error from {provider} (status {status}): {message}")]
    GenerativeTransient {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Generation request to {provider} failed: {message}")]
    GenerativeRequest { provider: String, message: String },

    #[error("Generation failed for {document_key} after {attempts} attempt(s): {message}")]
    GenerativeFatal {
        document_key: String,
        attempts: u32,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Rate-limit and overload signals that the orchestrator retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::GenerativeTransient { .. })
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
