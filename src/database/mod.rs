// file: src/database/mod.rs
// description: vector store operations module exports
// reference: internal module structure

pub mod client;
pub mod insert;
pub mod schema;

pub use client::LanceDbClient;
pub use insert::PaperWriter;
pub use schema::SchemaManager;
