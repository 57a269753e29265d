// file: src/pipeline/ingest.rs
// description: batch ingestion of paper files into the vector store
// reference: orchestrates asynchronous scan, embed and upsert workflow

use crate::config::Config;
use crate::database::{LanceDbClient, PaperWriter};
use crate::embedding::EmbeddingClient;
use crate::error::{PipelineError, Result};
use crate::models::PaperDocument;
use crate::pipeline::extractor::{PlainTextExtractor, TextExtractor, load_document};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::pipeline::scanner::{FileScanner, ScannedFile};
use crate::utils::OperationTimer;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

struct EmbeddedPaper {
    file: ScannedFile,
    document: PaperDocument,
    embedding: Vec<f32>,
}

pub struct IngestionJob {
    config: Config,
    client: LanceDbClient,
    embedder: Arc<EmbeddingClient>,
    extractor: Arc<dyn TextExtractor>,
    show_progress: bool,
    colored: bool,
}

impl IngestionJob {
    pub fn new(config: Config, client: LanceDbClient, embedder: Arc<EmbeddingClient>) -> Self {
        Self {
            config,
            client,
            embedder,
            extractor: Arc::new(PlainTextExtractor),
            show_progress: false,
            colored: false,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress(mut self, colored: bool) -> Self {
        self.show_progress = true;
        self.colored = colored;
        self
    }

    /// Embeds files with bounded parallelism and writes them one at a time.
    /// A failed file is counted and skipped; a dimension mismatch stops the
    /// run because every later write would fail the same way.
    pub async fn run(&self) -> Result<PipelineStats> {
        let timer = OperationTimer::new("ingest");
        let papers_dir = self.config.ingest.papers_dir.clone();

        let files = self.scan_files().await?;
        if files.is_empty() {
            warn!("No paper files found in {}", papers_dir.display());
            return Ok(PipelineStats::new());
        }

        let workers = self.config.ingest.parallel_workers.max(1);
        info!(
            "Ingesting {} files with {} embedding workers via {}",
            files.len(),
            workers,
            self.embedder.provider_name()
        );

        let progress = if self.show_progress {
            ProgressTracker::new(files.len(), self.colored)
        } else {
            ProgressTracker::hidden(files.len())
        };

        let writer = PaperWriter::new(&self.client);
        let mut embedded = stream::iter(files.into_iter().map(|file| self.embed_file(file)))
            .buffer_unordered(workers);

        while let Some(outcome) = embedded.next().await {
            let paper = match outcome {
                Ok(paper) => paper,
                Err((path, e)) => {
                    progress.inc_files_failed();
                    warn!("Failed to embed {}: {}", path, e);
                    continue;
                }
            };

            progress.set_message(format!("Writing {}", paper.file.relative_path));

            match writer.upsert(&paper.embedding, &paper.document.metadata).await {
                Ok(()) => {
                    progress.add_document();
                    progress.inc_files_processed(paper.file.size);
                }
                Err(e @ PipelineError::DimensionMismatch { .. }) => {
                    progress.inc_files_failed();
                    error!(
                        "Stopping ingestion at {}: {}",
                        paper.file.relative_path, e
                    );
                    return Err(e);
                }
                Err(e) => {
                    progress.inc_files_failed();
                    warn!("Failed to store {}: {}", paper.file.relative_path, e);
                }
            }
        }

        progress.finish();
        let stats = progress.get_stats();
        timer.finish_with_count(stats.documents_written);
        Self::log_final_stats(&stats);

        Ok(stats)
    }

    async fn scan_files(&self) -> Result<Vec<ScannedFile>> {
        let ingest_config = self.config.ingest.clone();

        tokio::task::spawn_blocking(move || {
            let scanner = FileScanner::new(ingest_config.clone());
            scanner.scan_directory(&ingest_config.papers_dir)
        })
        .await
        .map_err(|e| PipelineError::Validation(format!("File scanning task failed: {}", e)))?
    }

    async fn embed_file(
        &self,
        file: ScannedFile,
    ) -> std::result::Result<EmbeddedPaper, (String, PipelineError)> {
        let relative_path = file.relative_path.clone();
        let extractor = self.extractor.clone();
        let file_for_load = file.clone();

        let document = tokio::task::spawn_blocking(move || {
            load_document(extractor.as_ref(), &file_for_load)
        })
        .await
        .map_err(|e| {
            (
                relative_path.clone(),
                PipelineError::Extraction {
                    file: relative_path.clone(),
                    message: format!("Extraction task failed: {}", e),
                },
            )
        })?
        .map_err(|e| (relative_path.clone(), e))?;

        let embedding = self
            .embedder
            .embed(&document.text)
            .await
            .map_err(|e| (relative_path.clone(), e))?;

        Ok(EmbeddedPaper {
            file,
            document,
            embedding,
        })
    }

    fn log_final_stats(stats: &PipelineStats) {
        info!("=== Ingestion Summary ===");
        info!("Files scanned: {}", stats.files_scanned);
        info!("Files processed: {}", stats.files_processed);
        info!("Files failed: {}", stats.files_failed);
        info!("Success rate: {:.2}%", stats.success_rate());
        info!("Papers written: {}", stats.documents_written);
        info!(
            "Processing speed: {:.2} files/sec",
            stats.files_per_second()
        );
    }
}
