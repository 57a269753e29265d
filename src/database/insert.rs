// file: src/database/insert.rs
// description: LanceDB upsert of paper embeddings with metadata
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::database::schema::SchemaManager;
use crate::error::{PipelineError, Result};
use crate::models::PaperMetadata;
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub struct PaperWriter<'a> {
    client: &'a LanceDbClient,
}

impl<'a> PaperWriter<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    /// Store `embedding` under `metadata.id`, replacing any existing row with
    /// the same id in a single commit. The first write fixes the table's
    /// embedding dimension.
    pub async fn upsert(&self, embedding: &[f32], metadata: &PaperMetadata) -> Result<()> {
        if metadata.id.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Paper id must not be empty".to_string(),
            ));
        }
        if embedding.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Empty embedding for paper {}",
                metadata.id
            )));
        }

        let schema = SchemaManager::get_papers_schema(embedding.len());
        let record_batch = Self::create_record_batch(schema.clone(), metadata, embedding)?;
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            self.client
                .get_connection()
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(record_batch)], schema.clone()),
                )
                .execute()
                .await
                .map_err(|e| PipelineError::StoreWrite(format!("Failed to create table: {}", e)))?;
            info!(
                "Created new table: {} ({} dimensions)",
                table_name,
                embedding.len()
            );
        } else {
            let table = self.client.get_table(table_name).await?;
            self.client.ensure_dimension(&table, embedding.len()).await?;

            let mut merge = table.merge_insert(&["id"]);
            merge
                .when_matched_update_all(None)
                .when_not_matched_insert_all();
            merge
                .execute(Box::new(RecordBatchIterator::new(
                    vec![Ok(record_batch)],
                    schema,
                )))
                .await
                .map_err(|e| {
                    PipelineError::StoreWrite(format!(
                        "Failed to upsert paper {}: {}",
                        metadata.id, e
                    ))
                })?;
        }

        debug!("Upserted paper: {} ({})", metadata.id, metadata.source);
        Ok(())
    }

    fn create_record_batch(
        schema: Arc<arrow_schema::Schema>,
        metadata: &PaperMetadata,
        embedding: &[f32],
    ) -> Result<RecordBatch> {
        let ingested_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let values = Float32Array::from(embedding.to_vec());
        let embedding_list = FixedSizeListArray::try_new_from_values(values, embedding.len() as i32)
            .map_err(|e| {
                PipelineError::StoreWrite(format!("Failed to create embedding array: {}", e))
            })?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![metadata.id.as_str()])),
                Arc::new(StringArray::from(vec![metadata.title.as_str()])),
                Arc::new(StringArray::from(vec![metadata.authors.as_str()])),
                Arc::new(StringArray::from(vec![metadata.year.as_str()])),
                Arc::new(StringArray::from(vec![metadata.abstract_text.as_str()])),
                Arc::new(StringArray::from(vec![metadata.source.as_str()])),
                Arc::new(UInt64Array::from(vec![ingested_at])),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| PipelineError::StoreWrite(format!("Failed to create record batch: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn metadata(id: &str, title: &str) -> PaperMetadata {
        PaperMetadata {
            id: id.to_string(),
            title: title.to_string(),
            authors: "Park, Choi".to_string(),
            year: "2022".to_string(),
            abstract_text: format!("Abstract of {}", title),
            source: format!("{}.pdf", id),
        }
    }

    async fn client(temp: &TempDir) -> LanceDbClient {
        LanceDbClient::new(StoreConfig {
            uri: temp.path().join("db").display().to_string(),
            table_name: "papers".to_string(),
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_record_batch_shape() {
        let schema = SchemaManager::get_papers_schema(3);
        let batch =
            PaperWriter::create_record_batch(schema, &metadata("a", "A"), &[0.1, 0.2, 0.3])
                .unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 8);
    }

    #[tokio::test]
    async fn test_upsert_then_query_returns_same_paper_first() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        writer.upsert(&[1.0, 0.0, 0.0], &metadata("a", "A")).await.unwrap();
        writer.upsert(&[0.0, 1.0, 0.0], &metadata("b", "B")).await.unwrap();

        let result = client.query(&[0.0, 1.0, 0.0], 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.matches[0].metadata, metadata("b", "B"));
        assert!(result.matches[0].distance.abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_id() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        writer.upsert(&[1.0, 0.0], &metadata("a", "First")).await.unwrap();
        writer.upsert(&[0.0, 1.0], &metadata("a", "Second")).await.unwrap();

        assert_eq!(client.count().await, 1);
        let result = client.query(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(result.matches[0].metadata.title, "Second");
    }

    #[tokio::test]
    async fn test_overwrite_is_one_table_version() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        writer.upsert(&[1.0, 0.0], &metadata("a", "First")).await.unwrap();
        let table = client.get_table("papers").await.unwrap();
        let before = table.version().await.unwrap();

        writer.upsert(&[0.0, 1.0], &metadata("a", "Second")).await.unwrap();
        let table = client.get_table("papers").await.unwrap();

        // no intermediate version without the paper
        assert_eq!(table.version().await.unwrap(), before + 1);
        assert_eq!(client.count().await, 1);
    }

    #[tokio::test]
    async fn test_mixed_dimensions_fail_fast() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        writer.upsert(&[1.0, 0.0, 0.0], &metadata("a", "A")).await.unwrap();

        let write_err = writer
            .upsert(&[1.0, 0.0], &metadata("b", "B"))
            .await
            .unwrap_err();
        assert!(matches!(
            write_err,
            PipelineError::DimensionMismatch { expected: 3, actual: 2 }
        ));

        let query_err = client.query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            query_err,
            PipelineError::DimensionMismatch { expected: 3, actual: 4 }
        ));
        assert_eq!(client.count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_paper() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        writer.upsert(&[1.0, 0.0], &metadata("a", "A")).await.unwrap();
        writer.upsert(&[0.0, 1.0], &metadata("b", "B")).await.unwrap();
        client.remove("a").await.unwrap();

        assert_eq!(client.count().await, 1);
        let result = client.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.matches[0].metadata.id, "b");
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let writer = PaperWriter::new(&client);

        let err = writer.upsert(&[1.0], &metadata("  ", "Blank")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
