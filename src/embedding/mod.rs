// file: src/embedding/mod.rs
// description: embedding providers and the document embedding client
// reference: internal module structure

pub mod client;
pub mod hash;
pub mod provider;
pub mod remote;

pub use client::EmbeddingClient;
pub use hash::HashEmbeddingProvider;
pub use provider::{EmbeddingProvider, provider_from_config};
pub use remote::RemoteEmbeddingProvider;
