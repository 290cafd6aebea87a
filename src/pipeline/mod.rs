
use tracing::{debug, info};

use crate::Result;
use crate::documents::Document;
use crate::providers::{EmbeddingProvider, LanguageModel};
use crate::store::StoreHandle;

/// Number of documents retrieved per question unless overridden.
pub const DEFAULT_K: usize = 4;

/// Low temperature keeps the model focused on the supplied context.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Instruction template for logistics questions. The model is told to answer
/// in Spanish, from the supplied context only, and to say so when the
/// context is insufficient.
pub const LOGISTICS_PROMPT: &str = "\
Eres un asistente experto en logística y cadena de suministro.
Tu trabajo es responder preguntas basándote ÚNICAMENTE en el contexto proporcionado.

Contexto de datos de logística:
{context}

Pregunta del usuario: {question}

Instrucciones:
1. Responde en español de manera clara y profesional
2. Usa SOLO la información del contexto proporcionado
3. Si la información no está en el contexto, indica que no tienes datos suficientes
4. Cuando menciones números o estadísticas, cita la fuente (orden, carrier, etc.)
5. Organiza tu respuesta de manera estructurada si es apropiado

Respuesta:";

/// Canned questions offered by the REPL and the demo command.
pub const EXAMPLE_QUERIES: [&str; 6] = [
    "¿Cuáles son los principales modos de envío utilizados?",
    "¿Qué carriers manejan las tarifas más bajas?",
    "Describe los problemas de entrega más comunes",
    "¿Cuáles son las rutas de envío más utilizadas?",
    "¿Qué productos tienen más ventas?",
    "Explica la estructura de costos de almacenamiento",
];

/// Per-query knobs, seeded from the config's chat model and overridable per
/// CLI invocation.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub k: usize,
    pub model: String,
    pub temperature: f32,
}

impl QueryOptions {
    #[inline]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            k: DEFAULT_K,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Concatenate retrieved documents into a single source-tagged context
/// block. Zero documents yield an empty context; the prompt template already
/// instructs the model how to handle that.
#[inline]
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Documento {} - {}]\n{}", i + 1, doc.source(), doc.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn render_prompt(context: &str, question: &str) -> String {
    LOGISTICS_PROMPT
        .replace("{context}", context)
        .replace("{question}", question)
}

/// The retrieval-augmented query pipeline: retrieve, compose, generate.
///
/// No retries and no fallbacks; collaborator failures propagate to the
/// caller untouched.
pub struct QueryPipeline<'a> {
    handle: &'a StoreHandle,
    embedder: &'a dyn EmbeddingProvider,
    model: &'a dyn LanguageModel,
    options: QueryOptions,
}

impl<'a> QueryPipeline<'a> {
    #[inline]
    pub fn new(
        handle: &'a StoreHandle,
        embedder: &'a dyn EmbeddingProvider,
        model: &'a dyn LanguageModel,
        options: QueryOptions,
    ) -> Self {
        Self {
            handle,
            embedder,
            model,
            options,
        }
    }

    /// Answer a free-text question from the indexed documents. The model
    /// output is returned verbatim.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<String> {
        debug!("Answering question: {}", question);

        let documents = self
            .handle
            .retrieve(self.embedder, question, self.options.k)
            .await?;
        info!("Retrieved {} documents for context", documents.len());

        let context = format_context(&documents);
        let prompt = render_prompt(&context, question);

        self.model
            .generate(&prompt, &self.options.model, self.options.temperature)
    }
}
