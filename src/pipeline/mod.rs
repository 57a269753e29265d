// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod evaluate;
mod extractor;
mod ingest;
mod progress;
mod scanner;

pub use evaluate::EvaluationSession;
pub use extractor::{
    Authors, PlainTextExtractor, SidecarMetadata, TextExtractor, Year, build_document,
    first_paragraph, load_document,
};
pub use ingest::IngestionJob;
pub use progress::{PipelineStats, ProgressTracker};
pub use scanner::{FileScanner, ScannedFile};
