use super::*;
use crate::config::{Config, DatasetsConfig, OpenAiConfig};
use std::hash::{DefaultHasher, Hash, Hasher};
use tempfile::TempDir;

/// Deterministic bag-of-words embedder: each token bumps one hashed slot,
/// so overlapping texts land near each other.
struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    fn new() -> Self {
        Self { dimension: 32 }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dimension];
                for token in text
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                {
                    let mut hasher = DefaultHasher::new();
                    token.hash(&mut hasher);
                    let slot = (hasher.finish() as usize) % self.dimension;
                    vector[slot] += 1.0;
                }
                let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for v in &mut vector {
                        *v /= norm;
                    }
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        openai: OpenAiConfig::default(),
        datasets: DatasetsConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    }
}

fn document(content: &str, source: &str, extra: &[(&str, &str)]) -> Document {
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), source.to_string());
    for (key, value) in extra {
        metadata.insert((*key).to_string(), (*value).to_string());
    }
    Document {
        content: content.to_string(),
        metadata,
    }
}

#[tokio::test]
async fn index_rejects_empty_document_set() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");

    let result = store.index(&HashEmbedder::new(), &[], "logistics_docs").await;

    assert!(matches!(result, Err(RagError::NoDocuments)));
}

#[tokio::test]
async fn open_returns_none_on_fresh_environment() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");

    let handle = store.open("logistics_docs").await.expect("open should not error");

    assert!(handle.is_none());
}

#[tokio::test]
async fn index_then_open_reports_count() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");
    let embedder = HashEmbedder::new();

    let documents = vec![
        document("Tarifa de flete aérea", "freight_rates", &[("carrier", "V444_0")]),
        document("Orden de logística", "order_list", &[("order_id", "1")]),
        document("Orden de envío", "supply_chain_dataset", &[("order_id", "2")]),
    ];

    store
        .index(&embedder, &documents, "logistics_docs")
        .await
        .expect("index should succeed");

    let handle = store
        .open("logistics_docs")
        .await
        .expect("open should not error")
        .expect("collection should exist after indexing");

    assert_eq!(handle.count().await.expect("count should succeed"), 3);
}

#[tokio::test]
async fn reindexing_overwrites_the_collection() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");
    let embedder = HashEmbedder::new();

    let first = vec![
        document("uno", "freight_rates", &[]),
        document("dos", "freight_rates", &[]),
        document("tres", "freight_rates", &[]),
    ];
    let second = vec![document("cuatro", "freight_rates", &[])];

    store
        .index(&embedder, &first, "logistics_docs")
        .await
        .expect("first index should succeed");
    let handle = store
        .index(&embedder, &second, "logistics_docs")
        .await
        .expect("second index should succeed");

    // Overwrite semantics: the collection reflects only the last batch.
    assert_eq!(handle.count().await.expect("count should succeed"), 1);
}

#[tokio::test]
async fn retrieve_respects_k_bound() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");
    let embedder = HashEmbedder::new();

    let documents = vec![
        document("Tarifa de flete para carrier V444_0", "freight_rates", &[]),
        document("Tarifa de flete para carrier V444_1", "freight_rates", &[]),
        document("Orden de logística desde PORT09", "order_list", &[]),
    ];

    let handle = store
        .index(&embedder, &documents, "logistics_docs")
        .await
        .expect("index should succeed");

    let one = handle
        .retrieve(&embedder, "tarifa de flete", 1)
        .await
        .expect("retrieve should succeed");
    assert_eq!(one.len(), 1);

    let many = handle
        .retrieve(&embedder, "tarifa de flete", 10)
        .await
        .expect("retrieve should succeed");
    assert!(many.len() <= 10);
    assert_eq!(many.len(), 3);

    let none = handle
        .retrieve(&embedder, "tarifa de flete", 0)
        .await
        .expect("retrieve should succeed");
    assert!(none.is_empty());
}

#[tokio::test]
async fn retrieved_documents_roundtrip_metadata() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::connect(&test_config(&temp_dir))
        .await
        .expect("should connect");
    let embedder = HashEmbedder::new();

    let documents = vec![document(
        "Tarifa de Flete\nCarrier: V444_0\nTarifa: $3.10",
        "freight_rates",
        &[("carrier", "V444_0"), ("mode", "AIR")],
    )];

    let handle = store
        .index(&embedder, &documents, "logistics_docs")
        .await
        .expect("index should succeed");

    let retrieved = handle
        .retrieve(&embedder, "carrier tarifa", 1)
        .await
        .expect("retrieve should succeed");

    assert_eq!(retrieved.len(), 1);
    assert_eq!(retrieved[0], documents[0]);
    assert_eq!(retrieved[0].source(), "freight_rates");
}
