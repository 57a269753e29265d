// file: src/generation/mod.rs
// description: generative model backends, pacing and feedback orchestration
// reference: internal module structure

pub mod backend;
pub mod cache;
pub mod gemini;
pub mod openai;
pub mod orchestrator;
pub mod prompts;
pub mod rate_limit;

pub use backend::{GenerationRequest, GenerativeModel, model_from_config};
pub use cache::SummaryCache;
pub use gemini::GeminiModel;
pub use openai::OpenAiChatModel;
pub use orchestrator::{AttemptRecord, FeedbackOrchestrator, SummaryBatch};
pub use prompts::PromptTemplate;
pub use rate_limit::{RateLimiter, RetryPolicy};
