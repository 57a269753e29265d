// file: src/generation/orchestrator.rs
// description: sequential, paced summarization and feedback generation
// reference: https://docs.rs/tokio/latest/tokio/time

use crate::config::{FailurePolicy, GenerationConfig};
use crate::error::{PipelineError, Result};
use crate::generation::backend::{GenerationRequest, GenerativeModel};
use crate::generation::cache::SummaryCache;
use crate::generation::prompts::{PromptTemplate, feedback_input, paper_input};
use crate::generation::rate_limit::{RateLimiter, RetryPolicy};
use crate::models::{DocumentSummary, SimilarPaper, SummaryFailure};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const FEEDBACK_KEY: &str = "<feedback>";

/// One generative attempt and the total delay paid before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub waited: Duration,
}

#[derive(Debug, Default)]
pub struct SummaryBatch {
    pub summaries: Vec<DocumentSummary>,
    pub failures: Vec<SummaryFailure>,
}

pub struct FeedbackOrchestrator {
    model: Arc<dyn GenerativeModel>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    cache: SummaryCache,
    temperature: f32,
    max_output_tokens: u32,
    inter_document_delay: Duration,
    failure_policy: FailurePolicy,
    last_attempts: Vec<AttemptRecord>,
    requests_sent: u64,
}

impl FeedbackOrchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &GenerationConfig) -> Self {
        Self {
            model,
            limiter: Arc::new(RateLimiter::new(config.requests_per_minute)),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.base_delay_ms),
            ),
            cache: SummaryCache::new(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            inter_document_delay: Duration::from_millis(config.inter_document_delay_ms),
            failure_policy: FailurePolicy::default(),
            last_attempts: Vec::new(),
            requests_sent: 0,
        }
    }

    /// Shares `limiter` with other orchestrators talking to the same backend.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Attempts made by the most recent generation that reached the backend.
    pub fn last_attempts(&self) -> &[AttemptRecord] {
        &self.last_attempts
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Summary of `text`, served from the session cache when `document_key`
    /// was already summarized.
    pub async fn summarize(
        &mut self,
        text: &str,
        system_prompt: &str,
        document_key: &str,
    ) -> Result<String> {
        if let Some(summary) = self.cache.get(document_key) {
            debug!("Summary cache hit: {}", document_key);
            return Ok(summary.to_string());
        }

        let request = self.request(system_prompt, text);
        let summary = self.generate_with_retry(document_key, &request).await?;
        self.cache.insert(document_key, summary.clone());
        Ok(summary)
    }

    /// Summarizes `papers` one at a time in the given order.
    pub async fn summarize_all(
        &mut self,
        papers: &[SimilarPaper],
        prompt: &PromptTemplate,
    ) -> Result<SummaryBatch> {
        let mut batch = SummaryBatch::default();

        for (index, paper) in papers.iter().enumerate() {
            if index > 0 && !self.inter_document_delay.is_zero() {
                sleep(self.inter_document_delay).await;
            }

            let metadata = &paper.metadata;
            let key = metadata.cache_key().to_string();
            let system_prompt = prompt.render(metadata, index + 1);

            info!("Summarizing [{}/{}]: {}", index + 1, papers.len(), metadata.title);

            match self.summarize(&paper_input(metadata), &system_prompt, &key).await {
                Ok(summary) => batch.summaries.push(DocumentSummary {
                    document_key: key,
                    title: metadata.title.clone(),
                    summary,
                }),
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        error!("Aborting summaries at {}: {}", key, e);
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping {} after failed summary: {}", key, e);
                        batch.failures.push(SummaryFailure {
                            document_key: key,
                            title: metadata.title.clone(),
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(batch)
    }

    /// Final feedback over the draft and every collected summary. Never cached.
    pub async fn generate_feedback(
        &mut self,
        user_text: &str,
        summaries: &[DocumentSummary],
        system_prompt: &str,
    ) -> Result<String> {
        info!("Generating feedback from {} summaries", summaries.len());
        let request = self.request(system_prompt, &feedback_input(user_text, summaries));
        self.generate_with_retry(FEEDBACK_KEY, &request).await
    }

    fn request(&self, system_prompt: &str, user_content: &str) -> GenerationRequest {
        GenerationRequest::new(system_prompt, user_content)
            .with_sampling(self.temperature, self.max_output_tokens)
    }

    async fn generate_with_retry(
        &mut self,
        document_key: &str,
        request: &GenerationRequest,
    ) -> Result<String> {
        let max_attempts = self.retry.max_attempts();
        let mut attempts = Vec::new();
        let mut backoff = Duration::ZERO;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let delay = backoff + self.retry.pre_request_delay(attempt);
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let held = self.limiter.acquire().await;

            attempts.push(AttemptRecord {
                attempt,
                waited: delay + held,
            });
            self.requests_sent += 1;

            debug!(
                "Generation attempt {}/{} for {} via {}",
                attempt,
                max_attempts,
                document_key,
                self.model.name()
            );

            match self.model.generate(request).await {
                Ok(text) => {
                    self.last_attempts = attempts;
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        "Transient failure on attempt {}/{} for {}: {}",
                        attempt, max_attempts, document_key, e
                    );
                    last_error = e.to_string();
                    backoff = self.retry.backoff(attempt);
                }
                Err(e) => {
                    self.last_attempts = attempts;
                    return Err(PipelineError::GenerativeFatal {
                        document_key: document_key.to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.last_attempts = attempts;
        Err(PipelineError::GenerativeFatal {
            document_key: document_key.to_string(),
            attempts: max_attempts,
            message: last_error,
        })
    }
}
