// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod embedding;
pub mod error;
pub mod exporter;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod text;
pub mod utils;

pub use config::{
    ChunkingConfig, Config, EmbeddingConfig, EmbeddingProviderKind, EvaluationConfig,
    FailurePolicy, GenerationConfig, GenerationProviderKind, IngestConfig, RetrievalConfig,
    StoreConfig,
};
pub use database::{LanceDbClient, PaperWriter, SchemaManager};
pub use embedding::{EmbeddingClient, EmbeddingProvider, HashEmbeddingProvider};
pub use error::{PipelineError, Result};
pub use exporter::json::JsonExporter;
pub use generation::{
    AttemptRecord, FeedbackOrchestrator, GenerationRequest, GenerativeModel, PromptTemplate,
    RateLimiter, RetryPolicy, SummaryCache,
};
pub use models::{
    DocumentSummary, FeedbackReport, PaperDocument, PaperMetadata, QueryResult, SimilarPaper,
    SummaryFailure,
};
pub use pipeline::{EvaluationSession, IngestionJob, PipelineStats, TextExtractor};
pub use text::{TextChunker, TextNormalizer, TokenCounter};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
