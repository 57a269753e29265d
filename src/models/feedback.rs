// file: src/models/feedback.rs
// description: per-document summaries and the final feedback report
// reference: internal data structures

use crate::models::SimilarPaper;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_key: String,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFailure {
    pub document_key: String,
    pub title: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub session_id: String,
    pub generated_at: String,
    pub similar_papers: Vec<SimilarPaper>,
    pub summaries: Vec<DocumentSummary>,
    pub failures: Vec<SummaryFailure>,
    pub feedback: String,
}

impl FeedbackReport {
    pub fn new(
        session_id: String,
        similar_papers: Vec<SimilarPaper>,
        summaries: Vec<DocumentSummary>,
        failures: Vec<SummaryFailure>,
        feedback: String,
    ) -> Self {
        Self {
            session_id,
            generated_at: Utc::now().to_rfc3339(),
            similar_papers,
            summaries,
            failures,
            feedback,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
