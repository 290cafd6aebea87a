use anyhow::Context;
use console::style;
use dialoguer::Input;
use tracing::info;

use crate::config::Config;
use crate::datasets::download_datasets;
use crate::documents::load_documents;
use crate::pipeline::{EXAMPLE_QUERIES, QueryOptions, QueryPipeline};
use crate::providers::OpenAiClient;
use crate::store::{DEFAULT_COLLECTION, StoreHandle, VectorStore};
use crate::{RagError, Result};

/// Fetch the logistics datasets into the local cache.
#[inline]
pub fn download(config: &Config, force: bool) -> Result<()> {
    println!("{}", style("Descarga de datasets").bold());

    let downloaded = download_datasets(config, force)?;

    for (name, path) in &downloaded {
        println!("  [OK] {}: {}", name, path.display());
    }

    if downloaded.is_empty() {
        println!("  [ERROR] No se pudo descargar ningún dataset");
    } else {
        println!("\n[OK] Descarga completada ({} datasets)", downloaded.len());
    }

    Ok(())
}

/// Build documents from the cached datasets and index them.
#[inline]
pub async fn index(config: &Config, row_cap: Option<usize>) -> Result<()> {
    println!("{}", style("Indexación de documentos").bold());

    let documents = load_documents(config, row_cap);

    if documents.is_empty() {
        println!("[ERROR] No hay documentos para indexar.");
        println!("        Ejecuta primero: logistics-rag download");
        return Err(RagError::NoDocuments);
    }

    let embedder = OpenAiClient::new(&config.openai)?;
    let store = VectorStore::connect(config).await?;

    let handle = store
        .index(&embedder, &documents, DEFAULT_COLLECTION)
        .await?;

    println!(
        "\n[OK] Indexación completada: {} documentos en '{}'",
        handle.count().await?,
        handle.collection()
    );

    Ok(())
}

/// Answer a single question from the indexed documents.
#[inline]
pub async fn query(
    config: &Config,
    question: &str,
    k: usize,
    model: Option<String>,
    temperature: f32,
) -> Result<()> {
    let Some((handle, client)) = open_collection(config).await? else {
        return Ok(());
    };
    let options = query_options(config, k, model, temperature);
    let pipeline = QueryPipeline::new(&handle, &client, &client, options);

    println!("\n[?] Pregunta: {}\n", question);
    let answer = pipeline.answer(question).await?;
    println!("[>] Respuesta:\n{}\n", answer);

    Ok(())
}

/// Interactive question loop. `salir` leaves, `ejemplos` lists the canned
/// questions, blank input is ignored.
#[inline]
pub async fn interactive(config: &Config, k: usize, model: Option<String>, temperature: f32) -> Result<()> {
    let Some((handle, client)) = open_collection(config).await? else {
        return Ok(());
    };
    let options = query_options(config, k, model, temperature);
    let pipeline = QueryPipeline::new(&handle, &client, &client, options);

    println!("{}", style("Asistente de logística").bold());
    println!("Escribe 'salir' para terminar, 'ejemplos' para ver preguntas de ejemplo.\n");

    loop {
        let input: String = Input::new()
            .with_prompt("[?] Tu pregunta")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if matches!(input.to_lowercase().as_str(), "salir" | "exit" | "quit" | "q") {
            println!("\nHasta luego!");
            break;
        }

        if input.eq_ignore_ascii_case("ejemplos") {
            println!("\nPreguntas de ejemplo:");
            for (i, example) in EXAMPLE_QUERIES.iter().enumerate() {
                println!("  {}. {}", i + 1, example);
            }
            println!();
            continue;
        }

        println!("\n[...] Procesando...");
        let answer = pipeline.answer(input).await?;
        println!("\n[>] Respuesta:\n{}\n", answer);
        println!("{}\n", "-".repeat(40));
    }

    Ok(())
}

/// Run the first example questions against the index.
#[inline]
pub async fn demo(config: &Config, k: usize, model: Option<String>, temperature: f32) -> Result<()> {
    let Some((handle, client)) = open_collection(config).await? else {
        return Ok(());
    };
    let options = query_options(config, k, model, temperature);
    let pipeline = QueryPipeline::new(&handle, &client, &client, options);

    let demo_queries = &EXAMPLE_QUERIES[..3];

    for (i, question) in demo_queries.iter().enumerate() {
        println!(
            "\n{}",
            style(format!("[Demo {}/{}]", i + 1, demo_queries.len())).bold()
        );
        println!("[?] Pregunta: {}\n", question);

        let answer = pipeline.answer(question).await?;
        println!("[>] Respuesta:\n{}", answer);
    }

    Ok(())
}

/// Open the default collection, or print the remediation steps when nothing
/// has been indexed yet. "Not indexed" is a recoverable condition, not an
/// error.
async fn open_collection(config: &Config) -> Result<Option<(StoreHandle, OpenAiClient)>> {
    let store = VectorStore::connect(config).await?;

    let Some(handle) = store.open(DEFAULT_COLLECTION).await? else {
        println!("[ERROR] No hay datos indexados.");
        println!("        Ejecuta primero:");
        println!("        1. logistics-rag download");
        println!("        2. logistics-rag index");
        return Ok(None);
    };

    let count = handle.count().await?;
    if count == 0 {
        println!("[ERROR] El índice existe pero está vacío.");
        println!("        Ejecuta: logistics-rag index");
        return Ok(None);
    }

    info!("Opened collection '{}' with {} documents", handle.collection(), count);

    let client = OpenAiClient::new(&config.openai)?;
    Ok(Some((handle, client)))
}

fn query_options(config: &Config, k: usize, model: Option<String>, temperature: f32) -> QueryOptions {
    let mut options = QueryOptions::new(model.unwrap_or_else(|| config.openai.chat_model.clone()));
    options.k = k;
    options.temperature = temperature;
    options
}
