pub mod openai;

pub use openai::OpenAiClient;

use crate::Result;

/// Embedding computation collaborator. One production adapter
/// ([`OpenAiClient`]) plus deterministic fakes in the integration tests.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

/// Text generation collaborator.
pub trait LanguageModel: Send + Sync {
    /// Generate text for a prompt with the given model id and temperature.
    fn generate(&self, prompt: &str, model: &str, temperature: f32) -> Result<String>;
}
