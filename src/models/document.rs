// file: src/models/document.rs
// description: paper document and stored metadata models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata persisted next to each embedding and returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub year: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub source: String,
}

/// A paper as seen at ingestion time. The full text is only used to derive
/// the embedding and is never written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperDocument {
    pub metadata: PaperMetadata,
    pub text: String,
}

impl PaperDocument {
    pub fn new(metadata: PaperMetadata, text: String) -> Self {
        Self { metadata, text }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl PaperMetadata {
    /// Key used for the per-session summary cache.
    pub fn cache_key(&self) -> &str {
        if self.source.is_empty() {
            &self.id
        } else {
            &self.source
        }
    }
}
