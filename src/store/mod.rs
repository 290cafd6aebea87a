#[cfg(test)]
mod tests;

use arrow::array::{FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::documents::Document;
use crate::providers::EmbeddingProvider;
use crate::{RagError, Result};

/// Collection name used by the command surface.
pub const DEFAULT_COLLECTION: &str = "logistics_docs";

/// Vector index over embedded documents, persisted with LanceDB.
///
/// Each collection is one named table. Indexing into an existing collection
/// name overwrites it, so a collection always reflects the last `index`
/// call exactly.
pub struct VectorStore {
    connection: Connection,
    db_path: PathBuf,
}

/// An open, persisted collection ready for counting and retrieval.
pub struct StoreHandle {
    table: Table,
    collection: String,
}

impl VectorStore {
    #[inline]
    pub async fn connect(config: &Config) -> Result<Self> {
        let db_path = config.vector_database_path();
        debug!("Opening LanceDB at {}", db_path.display());

        std::fs::create_dir_all(&db_path).map_err(|e| {
            RagError::Store(format!("failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            db_path,
        })
    }

    /// Embed and persist a batch of documents under the given collection
    /// name, replacing any existing collection with that name.
    ///
    /// Fails with [`RagError::NoDocuments`] when `documents` is empty.
    #[inline]
    pub async fn index(
        &self,
        embedder: &dyn EmbeddingProvider,
        documents: &[Document],
        collection: &str,
    ) -> Result<StoreHandle> {
        if documents.is_empty() {
            return Err(RagError::NoDocuments);
        }

        info!(
            "Indexing {} documents into collection '{}'",
            documents.len(),
            collection
        );

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embedder.embed(&texts)?;

        if embeddings.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimension = embedder.dimension();
        let schema = collection_schema(dimension);
        let batch = build_record_batch(&schema, documents, &embeddings, dimension)?;

        self.drop_collection_if_exists(collection).await?;

        let table = self
            .connection
            .create_empty_table(collection, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to create collection table: {}", e)))?;

        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to insert documents: {}", e)))?;

        info!(
            "Collection '{}' persisted at {}",
            collection,
            self.db_path.display()
        );

        Ok(StoreHandle {
            table,
            collection: collection.to_string(),
        })
    }

    /// Reopen an existing persisted collection without recomputing anything.
    ///
    /// Returns `Ok(None)` when the on-disk artifact is absent: "not yet
    /// indexed" is a recoverable condition, not an error.
    #[inline]
    pub async fn open(&self, collection: &str) -> Result<Option<StoreHandle>> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to list collections: {}", e)))?;

        if !table_names.iter().any(|name| name == collection) {
            debug!("Collection '{}' not found", collection);
            return Ok(None);
        }

        let table = self
            .connection
            .open_table(collection)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to open collection: {}", e)))?;

        debug!("Opened collection '{}'", collection);
        Ok(Some(StoreHandle {
            table,
            collection: collection.to_string(),
        }))
    }

    async fn drop_collection_if_exists(&self, collection: &str) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to list collections: {}", e)))?;

        if table_names.iter().any(|name| name == collection) {
            info!("Replacing existing collection '{}'", collection);
            self.connection
                .drop_table(collection)
                .await
                .map_err(|e| RagError::Store(format!("failed to drop collection: {}", e)))?;
        }

        Ok(())
    }
}

impl StoreHandle {
    #[inline]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of documents stored in this collection.
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Store(format!("failed to count documents: {}", e)))
    }

    /// Return at most `k` documents nearest to the query text, in similarity
    /// order. Ranking is whatever the vector engine provides.
    #[inline]
    pub async fn retrieve(
        &self,
        embedder: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        debug!("Retrieving up to {} documents for query", k);

        let query_vectors = embedder.embed(&[query.to_string()])?;
        let query_vector = query_vectors
            .first()
            .ok_or_else(|| RagError::Embedding("embedder returned no query vector".to_string()))?;

        let mut stream = self
            .table
            .vector_search(query_vector.as_slice())
            .map_err(|e| RagError::Store(format!("failed to build vector search: {}", e)))?
            .column("vector")
            .limit(k)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("failed to execute search: {}", e)))?;

        let mut documents = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| RagError::Store(format!("failed to read result stream: {}", e)))?
        {
            documents.extend(parse_document_batch(&batch)?);
        }

        debug!("Retrieved {} documents", documents.len());
        Ok(documents)
    }
}

fn collection_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
    ]))
}

fn build_record_batch(
    schema: &Arc<Schema>,
    documents: &[Document],
    embeddings: &[Vec<f32>],
    dimension: usize,
) -> Result<RecordBatch> {
    let len = documents.len();

    let mut ids = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut metadata_json = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * dimension);

    for (document, embedding) in documents.iter().zip(embeddings) {
        if embedding.len() != dimension {
            return Err(RagError::Embedding(format!(
                "expected {}-dimensional vector, got {}",
                dimension,
                embedding.len()
            )));
        }

        ids.push(Uuid::new_v4().to_string());
        contents.push(document.content.as_str());
        sources.push(document.source().to_string());
        metadata_json.push(
            serde_json::to_string(&document.metadata)
                .map_err(|e| RagError::Store(format!("failed to serialize metadata: {}", e)))?,
        );
        flat_values.extend_from_slice(embedding);
    }

    let values_array = Float32Array::from(flat_values);
    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(item_field, dimension as i32, Arc::new(values_array), None)
            .map_err(|e| RagError::Store(format!("failed to create vector array: {}", e)))?;

    RecordBatch::try_new(
        Arc::clone(schema),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(metadata_json)),
        ],
    )
    .map_err(|e| RagError::Store(format!("failed to create record batch: {}", e)))
}

fn parse_document_batch(batch: &RecordBatch) -> Result<Vec<Document>> {
    let contents = string_column(batch, "content")?;
    let metadata_json = string_column(batch, "metadata")?;

    let mut documents = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let metadata: BTreeMap<String, String> = serde_json::from_str(metadata_json.value(row))
            .map_err(|e| RagError::Store(format!("failed to parse stored metadata: {}", e)))?;

        documents.push(Document {
            content: contents.value(row).to_string(),
            metadata,
        });
    }

    Ok(documents)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Store(format!("missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Store(format!("invalid {} column type", name)))
}
