// file: src/models/search_result.rs
// description: Nearest-neighbour query results with distances
// reference: Used for vector similarity search results

use crate::models::PaperMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPaper {
    pub metadata: PaperMetadata,

    /// Cosine distance (lower is more similar)
    pub distance: f32,
}

impl SimilarPaper {
    pub fn new(metadata: PaperMetadata, distance: f32) -> Self {
        Self { metadata, distance }
    }

    /// Similarity reported to users, assuming a cosine distance in [0, 1].
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, rank: usize, max_abstract_len: usize) -> String {
        let abstract_preview = if self.metadata.abstract_text.chars().count() > max_abstract_len {
            let truncated: String = self
                .metadata
                .abstract_text
                .chars()
                .take(max_abstract_len)
                .collect();
            format!("{}...", truncated)
        } else {
            self.metadata.abstract_text.clone()
        };

        format!(
            "{}. {} (similarity: {:.4})\n   Authors: {}\n   Year: {}\n   Source: {}\n   Abstract: {}\n",
            rank,
            self.metadata.title,
            self.similarity(),
            self.metadata.authors,
            self.metadata.year,
            self.metadata.source,
            abstract_preview
        )
    }
}

/// Matches ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub matches: Vec<SimilarPaper>,
}

impl QueryResult {
    pub fn new(mut matches: Vec<SimilarPaper>) -> Self {
        // stable: equal distances keep the order the store returned them in
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimilarPaper> {
        self.matches.iter()
    }

    pub fn metadata(&self) -> Vec<PaperMetadata> {
        self.matches.iter().map(|m| m.metadata.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, distance: f32) -> SimilarPaper {
        SimilarPaper::new(
            PaperMetadata {
                id: id.to_string(),
                title: format!("Title {}", id),
                authors: "Kim, Lee".to_string(),
                year: "2023".to_string(),
                abstract_text: "This is a very long abstract that will be truncated".to_string(),
                source: format!("{}.pdf", id),
            },
            distance,
        )
    }

    #[test]
    fn test_similarity_from_distance() {
        let result = paper("a", 0.13);
        assert!((result.similarity() - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_query_result_sorted_ascending() {
        let result = QueryResult::new(vec![paper("a", 0.4), paper("b", 0.1), paper("c", 0.25)]);
        let ids: Vec<&str> = result.iter().map(|m| m.metadata.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let result = QueryResult::new(vec![paper("x", 0.2), paper("y", 0.2), paper("z", 0.1)]);
        let ids: Vec<&str> = result.iter().map(|m| m.metadata.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_format_summary() {
        let summary = paper("a", 0.13).format_summary(1, 20);
        assert!(summary.contains("0.8700"));
        assert!(summary.contains("Title a"));
        assert!(summary.contains("..."));
    }
}
