use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch dataset: {0}")]
    Acquisition(String),

    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    #[error("No documents to index")]
    NoDocuments,

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod datasets;
pub mod documents;
pub mod pipeline;
pub mod providers;
pub mod store;
