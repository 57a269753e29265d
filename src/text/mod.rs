// file: src/text/mod.rs
// description: text preparation module exports
// reference: internal module structure

pub mod chunker;
pub mod normalizer;
pub mod tokenizer;

pub use chunker::TextChunker;
pub use normalizer::TextNormalizer;
pub use tokenizer::{
    HeuristicTokenCounter, HuggingFaceTokenCounter, TokenCounter, counter_from_config,
};
