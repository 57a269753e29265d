// file: src/database/schema.rs
// description: LanceDB schema management for paper embeddings
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::error::{PipelineError, Result};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use tracing::{info, warn};

pub const EMBEDDING_COLUMN: &str = "embedding";
pub const DISTANCE_COLUMN: &str = "_distance";

pub struct SchemaManager<'a> {
    client: &'a LanceDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    pub async fn verify_schema(&self) -> Result<bool> {
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            warn!("Table '{}' does not exist", table_name);
            return Ok(false);
        }

        match self.client.embedding_dimension().await? {
            Some(dim) => {
                info!("Table '{}' exists with {}-dimensional embeddings", table_name, dim);
                Ok(true)
            }
            None => {
                warn!(
                    "Table '{}' has no fixed-size '{}' column",
                    table_name, EMBEDDING_COLUMN
                );
                Ok(false)
            }
        }
    }

    /// Returns the Arrow schema for the papers table
    pub fn get_papers_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("authors", DataType::Utf8, false),
            Field::new("year", DataType::Utf8, false),
            Field::new("abstract", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("ingested_at", DataType::UInt64, false),
            Field::new(
                EMBEDDING_COLUMN,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Fixed-size list length of the embedding column in `schema`.
    pub fn embedding_dimension_of(schema: &Schema) -> Option<usize> {
        match schema.field_with_name(EMBEDDING_COLUMN).ok()?.data_type() {
            DataType::FixedSizeList(_, size) => Some(*size as usize),
            _ => None,
        }
    }

    pub async fn drop_all_tables(&self) -> Result<()> {
        warn!("Dropping all tables in LanceDB");

        let table_name = self.client.table_name();

        if self.client.table_exists(table_name).await? {
            self.client
                .get_connection()
                .drop_table(table_name)
                .await
                .map_err(|e| {
                    PipelineError::StoreWrite(format!(
                        "Failed to drop table {}: {}",
                        table_name, e
                    ))
                })?;
            info!("Dropped table: {}", table_name);
        }

        Ok(())
    }
}
