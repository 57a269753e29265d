// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod feedback;
pub mod search_result;

pub use document::{PaperDocument, PaperMetadata};
pub use feedback::{DocumentSummary, FeedbackReport, SummaryFailure};
pub use search_result::{QueryResult, SimilarPaper};
