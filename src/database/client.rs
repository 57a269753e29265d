// file: src/database/client.rs
// description: LanceDB client wrapper with connection management and similarity queries
// reference: https://docs.rs/lancedb

use crate::config::StoreConfig;
use crate::database::schema::{DISTANCE_COLUMN, EMBEDDING_COLUMN, SchemaManager};
use crate::error::{PipelineError, Result};
use crate::models::{PaperMetadata, QueryResult, SimilarPaper};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table, connect};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    config: StoreConfig,
}

impl LanceDbClient {
    /// Opens the store, creating the directory for local URIs so a first run
    /// against a fresh location never fails.
    pub async fn new(config: StoreConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        if !config.uri.contains("://") {
            tokio::fs::create_dir_all(Path::new(&config.uri))
                .await
                .map_err(|source| PipelineError::FileOperation {
                    path: config.uri.clone().into(),
                    source,
                })?;
        }

        let connection = connect(&config.uri).execute().await.map_err(|e| {
            PipelineError::StoreQuery(format!("Failed to connect to LanceDB: {}", e))
        })?;

        Ok(Self { connection, config })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        match self.connection.table_names().execute().await {
            Ok(_) => {
                info!("LanceDB connection successful");
                Ok(true)
            }
            Err(e) => Err(PipelineError::StoreQuery(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::StoreQuery(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::StoreQuery(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Number of stored papers. Never fails: a missing table or an unreadable
    /// store both report 0.
    pub async fn count(&self) -> u64 {
        match self.try_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count stored papers, reporting 0: {}", e);
                0
            }
        }
    }

    /// Number of stored papers, surfacing store errors. A missing table is 0.
    pub async fn try_count(&self) -> Result<u64> {
        if !self.table_exists(self.table_name()).await? {
            return Ok(0);
        }

        let table = self.get_table(self.table_name()).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::StoreQuery(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Embedding length of the existing table, or `None` before the first write.
    pub async fn embedding_dimension(&self) -> Result<Option<usize>> {
        if !self.table_exists(self.table_name()).await? {
            return Ok(None);
        }

        let table = self.get_table(self.table_name()).await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| PipelineError::StoreQuery(format!("Failed to read schema: {}", e)))?;

        Ok(SchemaManager::embedding_dimension_of(&schema))
    }

    pub(crate) async fn ensure_dimension(&self, table: &Table, actual: usize) -> Result<()> {
        let schema = table
            .schema()
            .await
            .map_err(|e| PipelineError::StoreQuery(format!("Failed to read schema: {}", e)))?;

        match SchemaManager::embedding_dimension_of(&schema) {
            Some(expected) if expected != actual => {
                Err(PipelineError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    /// Delete a single paper by id
    pub async fn remove(&self, id: &str) -> Result<()> {
        if !self.table_exists(self.table_name()).await? {
            info!("Table does not exist, nothing to delete");
            return Ok(());
        }

        let table = self.get_table(self.table_name()).await?;
        let predicate = id_predicate(id);

        debug!("Deleting papers with predicate: {}", predicate);

        table.delete(&predicate).await.map_err(|e| {
            PipelineError::StoreWrite(format!("Failed to delete paper {}: {}", id, e))
        })?;

        info!("Removed paper: {}", id);
        Ok(())
    }

    /// Nearest stored papers by cosine distance, closest first.
    ///
    /// Papers at exactly equal distance come back in whatever order the
    /// LanceDB scan produced them; no further tie-break is applied.
    pub async fn query(&self, embedding: &[f32], top_n: usize) -> Result<QueryResult> {
        if top_n == 0 {
            return Ok(QueryResult::default());
        }

        if !self.table_exists(self.table_name()).await? {
            warn!("Table does not exist, returning empty results");
            return Ok(QueryResult::default());
        }

        let table = self.get_table(self.table_name()).await?;
        self.ensure_dimension(&table, embedding.len()).await?;

        info!("Performing vector search with top_n {}", top_n);

        let mut results_stream = table
            .vector_search(embedding.to_vec())
            .map_err(|e| {
                PipelineError::StoreQuery(format!("Failed to create vector search: {}", e))
            })?
            .column(EMBEDDING_COLUMN)
            .distance_type(DistanceType::Cosine)
            .limit(top_n)
            .execute()
            .await
            .map_err(|e| PipelineError::StoreQuery(format!("Vector search failed: {}", e)))?;

        let mut matches = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                PipelineError::StoreQuery(format!("Failed to read result batch: {}", e))
            })?;
            matches.extend(Self::batch_to_matches(&batch)?);
        }

        info!("Vector search returned {} results", matches.len());
        Ok(QueryResult::new(matches))
    }

    fn batch_to_matches(batch: &RecordBatch) -> Result<Vec<SimilarPaper>> {
        let ids = string_column(batch, "id")?;
        let titles = string_column(batch, "title")?;
        let authors = string_column(batch, "authors")?;
        let years = string_column(batch, "year")?;
        let abstracts = string_column(batch, "abstract")?;
        let sources = string_column(batch, "source")?;

        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .ok_or_else(|| {
                PipelineError::StoreQuery(format!("Missing '{}' column", DISTANCE_COLUMN))
            })?
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| {
                PipelineError::StoreQuery(format!("Invalid '{}' column type", DISTANCE_COLUMN))
            })?;

        Ok((0..batch.num_rows())
            .map(|i| {
                let metadata = PaperMetadata {
                    id: ids.value(i).to_string(),
                    title: titles.value(i).to_string(),
                    authors: authors.value(i).to_string(),
                    year: years.value(i).to_string(),
                    abstract_text: abstracts.value(i).to_string(),
                    source: sources.value(i).to_string(),
                };
                let distance = if distances.is_null(i) {
                    f32::MAX
                } else {
                    distances.value(i)
                };
                SimilarPaper::new(metadata, distance)
            })
            .collect())
    }
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::StoreQuery(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::StoreQuery(format!("Invalid '{}' column type", name)))
}

pub(crate) fn id_predicate(id: &str) -> String {
    format!("id = '{}'", id.replace('\'', "''"))
}
