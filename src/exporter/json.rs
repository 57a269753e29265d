// file: src/exporter/json.rs
// description: json export of feedback reports

use crate::error::{PipelineError, Result};
use crate::models::FeedbackReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| PipelineError::FileOperation {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `feedback-<session id>.json` and returns its path.
    pub fn export_report(&self, report: &FeedbackReport, pretty: bool) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("feedback-{}.json", report.session_id));

        let json = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        fs::write(&path, json).map_err(|source| PipelineError::FileOperation {
            path: path.clone(),
            source,
        })?;

        info!(
            "Exported feedback report ({} summaries, {} failures) to {}",
            report.summaries.len(),
            report.failures.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn load_report(path: &Path) -> Result<FeedbackReport> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentSummary, PaperMetadata, SimilarPaper, SummaryFailure};
    use tempfile::tempdir;

    fn report() -> FeedbackReport {
        FeedbackReport::new(
            "session-1".to_string(),
            vec![SimilarPaper::new(
                PaperMetadata {
                    id: "a".to_string(),
                    title: "A".to_string(),
                    authors: "X".to_string(),
                    year: "2020".to_string(),
                    abstract_text: "About A.".to_string(),
                    source: "a.txt".to_string(),
                },
                0.12,
            )],
            vec![DocumentSummary {
                document_key: "a.txt".to_string(),
                title: "A".to_string(),
                summary: "Summary of A.".to_string(),
            }],
            vec![SummaryFailure {
                document_key: "b.txt".to_string(),
                title: "B".to_string(),
                error: "quota".to_string(),
            }],
            "Looks novel.".to_string(),
        )
    }

    #[test]
    fn test_exporter_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("exports").join("reports");
        let exporter = JsonExporter::new(&nested).unwrap();
        assert!(exporter.output_dir().is_dir());
    }

    #[test]
    fn test_export_report() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();

        let path = exporter.export_report(&report(), true).unwrap();
        assert_eq!(path, dir.path().join("feedback-session-1.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["session_id"], "session-1");
        assert_eq!(json["similar_papers"][0]["metadata"]["abstract"], "About A.");
        assert_eq!(json["failures"][0]["document_key"], "b.txt");
        assert_eq!(json["feedback"], "Looks novel.");

        let loaded = JsonExporter::load_report(&path).unwrap();
        assert_eq!(loaded.summaries.len(), 1);
        assert!(!loaded.is_complete());
    }
}
