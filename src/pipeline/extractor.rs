// file: src/pipeline/extractor.rs
// description: paper text extraction and sidecar metadata resolution
// reference: https://docs.rs/serde_json

use crate::error::{PipelineError, Result};
use crate::models::{PaperDocument, PaperMetadata};
use crate::pipeline::scanner::ScannedFile;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const MAX_ABSTRACT_CHARS: usize = 1000;

/// Turns a paper file into plain text. PDF conversion happens outside this
/// crate; implementations only need to handle what the scanner yields.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Err(PipelineError::Extraction {
                file: path.display().to_string(),
                message: "File contains no text".to_string(),
            });
        }

        Ok(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Authors {
    Single(String),
    List(Vec<String>),
}

impl Authors {
    pub fn joined(&self) -> String {
        match self {
            Authors::Single(name) => name.trim().to_string(),
            Authors::List(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Text(String),
    Number(i64),
}

impl Year {
    pub fn as_text(&self) -> String {
        match self {
            Year::Text(year) => year.trim().to_string(),
            Year::Number(year) => year.to_string(),
        }
    }
}

/// Optional `<stem>.json` metadata written next to a paper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SidecarMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Authors>,
    pub year: Option<Year>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl SidecarMetadata {
    /// Missing sidecar is `None`; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let sidecar = serde_json::from_str(&content).map_err(|e| PipelineError::Extraction {
            file: path.display().to_string(),
            message: format!("Invalid sidecar metadata: {}", e),
        })?;

        debug!("Loaded sidecar metadata: {}", path.display());
        Ok(Some(sidecar))
    }
}

/// Reads one scanned file into a document ready for embedding.
pub fn load_document(extractor: &dyn TextExtractor, file: &ScannedFile) -> Result<PaperDocument> {
    let text = extractor.extract_text(&file.path)?;

    let sidecar = match SidecarMetadata::load(&file.sidecar_path()) {
        Ok(sidecar) => sidecar.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring sidecar for {}: {}", file.relative_path, e);
            SidecarMetadata::default()
        }
    };

    Ok(build_document(file, text, sidecar))
}

pub fn build_document(file: &ScannedFile, text: String, sidecar: SidecarMetadata) -> PaperDocument {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let metadata = PaperMetadata {
        id: non_blank(sidecar.id).unwrap_or_else(|| PaperDocument::compute_hash(&text)),
        title: non_blank(sidecar.title).unwrap_or_else(|| file.stem()),
        authors: sidecar.authors.map(|a| a.joined()).unwrap_or_default(),
        year: sidecar.year.map(|y| y.as_text()).unwrap_or_default(),
        abstract_text: non_blank(sidecar.abstract_text)
            .unwrap_or_else(|| first_paragraph(&text, MAX_ABSTRACT_CHARS)),
        source: file.relative_path.clone(),
    };

    PaperDocument::new(metadata, text)
}

/// First non-empty paragraph with whitespace collapsed, cut to `max_chars`.
pub fn first_paragraph(text: &str, max_chars: usize) -> String {
    let normalized = text.replace("\r\n", "\n");
    let paragraph = normalized
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|p| !p.is_empty())
        .unwrap_or_default();

    paragraph.chars().take(max_chars).collect()
}
