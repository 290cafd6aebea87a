use clap::{Parser, Subcommand};
use logistics_rag::config::{Config, default_base_dir};
use logistics_rag::pipeline::{DEFAULT_K, DEFAULT_TEMPERATURE};
use logistics_rag::{RagError, Result, commands};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logistics-rag")]
#[command(about = "Retrieval-augmented question answering over logistics datasets")]
#[command(version)]
struct Cli {
    /// Base directory for the dataset cache, vector index, and config file
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the logistics datasets into the local cache
    Download {
        /// Re-download even when a cached file exists
        #[arg(long)]
        force: bool,
    },
    /// Build documents from the cached datasets and index them
    Index {
        /// Override the supply chain row cap
        #[arg(long)]
        row_cap: Option<usize>,
    },
    /// Ask a single question
    Query {
        /// The question to answer
        question: String,
        /// Number of documents to retrieve as context
        #[arg(long, default_value_t = DEFAULT_K)]
        k: usize,
        /// Override the configured chat model
        #[arg(long)]
        model: Option<String>,
        /// Generation temperature
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
    },
    /// Start an interactive question loop
    Interactive {
        /// Number of documents to retrieve as context
        #[arg(long, default_value_t = DEFAULT_K)]
        k: usize,
        /// Override the configured chat model
        #[arg(long)]
        model: Option<String>,
        /// Generation temperature
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
    },
    /// Run a demonstration with the example questions
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => default_base_dir().map_err(|e| RagError::Config(e.to_string()))?,
    };
    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Download { force } => {
            commands::download(&config, force)?;
        }
        Commands::Index { row_cap } => {
            commands::index(&config, row_cap).await?;
        }
        Commands::Query {
            question,
            k,
            model,
            temperature,
        } => {
            commands::query(&config, &question, k, model, temperature).await?;
        }
        Commands::Interactive { k, model, temperature } => {
            commands::interactive(&config, k, model, temperature).await?;
        }
        Commands::Demo => {
            commands::demo(&config, DEFAULT_K, None, DEFAULT_TEMPERATURE).await?;
        }
    }

    Ok(())
}
