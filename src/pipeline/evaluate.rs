// file: src/pipeline/evaluate.rs
// description: one evaluation session from draft text to feedback report
// reference: orchestrates retrieval, summarization and feedback

use crate::config::Config;
use crate::database::LanceDbClient;
use crate::embedding::EmbeddingClient;
use crate::error::{PipelineError, Result};
use crate::generation::{FeedbackOrchestrator, GenerativeModel, PromptTemplate, model_from_config};
use crate::models::{FeedbackReport, QueryResult};
use crate::utils::OperationTimer;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct EvaluationSession {
    session_id: String,
    client: LanceDbClient,
    embedder: Arc<EmbeddingClient>,
    orchestrator: FeedbackOrchestrator,
    top_n: usize,
    summary_prompt: PromptTemplate,
    feedback_prompt: PromptTemplate,
}

impl EvaluationSession {
    /// Starts a session with its own summary cache.
    pub fn new(
        config: &Config,
        client: LanceDbClient,
        embedder: Arc<EmbeddingClient>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        let orchestrator = FeedbackOrchestrator::new(model, &config.generation)
            .with_failure_policy(config.evaluation.failure_policy);

        let session_id = Uuid::new_v4().to_string();
        info!(
            "Evaluation session {} using {}",
            session_id,
            orchestrator.model_name()
        );

        Self {
            session_id,
            client,
            embedder,
            orchestrator,
            top_n: config.retrieval.top_n,
            summary_prompt: PromptTemplate::summary(config.evaluation.summary_prompt.as_deref()),
            feedback_prompt: PromptTemplate::feedback(
                config.evaluation.feedback_prompt.as_deref(),
            ),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = LanceDbClient::new(config.store.clone()).await?;
        let embedder = Arc::new(EmbeddingClient::from_config(config)?);
        let model = model_from_config(&config.generation)?;
        Ok(Self::new(config, client, embedder, model))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn orchestrator(&self) -> &FeedbackOrchestrator {
        &self.orchestrator
    }

    pub async fn find_similar(&self, user_text: &str) -> Result<QueryResult> {
        let embedding = self.embedder.embed(user_text).await?;
        self.client.query(&embedding, self.top_n).await
    }

    /// Retrieval, then every summary, then the feedback call.
    pub async fn evaluate(&mut self, user_text: &str) -> Result<FeedbackReport> {
        let timer = OperationTimer::new("evaluate");

        if user_text.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Paper text to evaluate is empty".to_string(),
            ));
        }

        if self.client.try_count().await? == 0 {
            return Err(PipelineError::Validation(
                "The paper store is empty; run `ingest` before evaluating".to_string(),
            ));
        }

        let similar = self.find_similar(user_text).await?;
        timer.checkpoint(&format!("retrieved {} similar papers", similar.len()));

        let batch = self
            .orchestrator
            .summarize_all(&similar.matches, &self.summary_prompt)
            .await?;

        if batch.summaries.is_empty() && !batch.failures.is_empty() {
            return Err(PipelineError::GenerativeRequest {
                provider: self.orchestrator.model_name().to_string(),
                message: format!(
                    "all {} summaries failed, no feedback generated; first error: {}",
                    batch.failures.len(),
                    batch.failures[0].error
                ),
            });
        }

        if !batch.failures.is_empty() {
            warn!(
                "{} of {} summaries failed; feedback uses the remaining {}",
                batch.failures.len(),
                similar.len(),
                batch.summaries.len()
            );
        }

        let feedback = self
            .orchestrator
            .generate_feedback(user_text, &batch.summaries, self.feedback_prompt.as_str())
            .await?;

        timer.finish_with_count(batch.summaries.len());

        Ok(FeedbackReport::new(
            self.session_id.clone(),
            similar.matches,
            batch.summaries,
            batch.failures,
            feedback,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingProviderKind, StoreConfig};
    use crate::database::PaperWriter;
    use crate::generation::GenerationRequest;
    use crate::models::PaperMetadata;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct EchoModel;

    #[async_trait]
    impl GenerativeModel for EchoModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(format!("echo: {}", request.user_content.len()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FailingModel {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl GenerativeModel for FailingModel {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(PipelineError::GenerativeRequest {
                provider: "failing".to_string(),
                message: "content blocked".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn paper(id: &str) -> PaperMetadata {
        PaperMetadata {
            id: id.to_string(),
            title: format!("Paper {}", id),
            authors: "Han".to_string(),
            year: "2023".to_string(),
            abstract_text: format!("Abstract {}", id),
            source: format!("{}.txt", id),
        }
    }

    async fn session(temp: &TempDir) -> EvaluationSession {
        session_with(temp, Arc::new(EchoModel)).await
    }

    async fn session_with(temp: &TempDir, model: Arc<dyn GenerativeModel>) -> EvaluationSession {
        let mut config = Config::default_config();
        config.store = StoreConfig {
            uri: temp.path().join("db").display().to_string(),
            table_name: "papers".to_string(),
        };
        config.embedding.provider = EmbeddingProviderKind::Hash;
        config.embedding.dimensions = Some(8);
        config.generation.base_delay_ms = 0;
        config.generation.inter_document_delay_ms = 0;
        config.generation.requests_per_minute = 0;

        let client = LanceDbClient::new(config.store.clone()).await.unwrap();
        let embedder = Arc::new(EmbeddingClient::from_config(&config).unwrap());
        EvaluationSession::new(&config, client, embedder, model)
    }

    async fn store_papers(session: &EvaluationSession, ids: &[&str]) {
        let writer = PaperWriter::new(&session.client);
        for id in ids {
            let embedding = session.embedder.embed(&format!("Paper {} text", id)).await.unwrap();
            writer.upsert(&embedding, &paper(id)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp).await;

        let err = session.evaluate("A draft about transformers.").await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.to_string().contains("ingest"));
    }

    #[tokio::test]
    async fn test_unreadable_store_error_is_reported() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp).await;
        store_papers(&session, &["a"]).await;

        std::fs::remove_dir_all(temp.path().join("db").join("papers.lance").join("_versions"))
            .unwrap();

        let err = session.evaluate("A draft about transformers.").await.unwrap_err();
        assert!(matches!(err, PipelineError::StoreQuery(_)), "{}", err);
    }

    #[tokio::test]
    async fn test_no_feedback_when_every_summary_fails() {
        let temp = TempDir::new().unwrap();
        let model = Arc::new(FailingModel {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let mut session = session_with(&temp, model.clone()).await;
        store_papers(&session, &["a", "b"]).await;

        let err = session.evaluate("A draft about transformers.").await.unwrap_err();

        assert!(matches!(err, PipelineError::GenerativeRequest { .. }));
        assert!(err.to_string().contains("all 2 summaries failed"));
        // one call per summary, none for feedback
        assert_eq!(model.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp).await;
        assert!(session.evaluate("  \n").await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_ids() {
        let temp = TempDir::new().unwrap();
        let first = session(&temp).await;
        let second = session(&temp).await;
        assert_ne!(first.session_id(), second.session_id());
        assert!(first.orchestrator().cache().is_empty());
    }
}
