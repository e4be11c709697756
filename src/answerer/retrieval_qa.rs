//! Question answering over the vector index using an LLM.

use std::sync::Arc;

use tracing::{debug, info};

use crate::index::{SimilarityMetric, VectorIndex};
use crate::models::ScoredChunk;
use crate::ollama::OllamaClientTrait;

use super::GenerationError;

/// Anything that can turn a question into an answer.
///
/// `RetrievalQa` is the real implementation; tests substitute their own.
pub trait AnswerAssembler {
    fn answer(&self, question: &str) -> Result<String, GenerationError>;
}

/// Models and retrieval parameters used for every question.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    /// Ollama model that writes the answer
    pub chat_model: String,
    /// Ollama model that embeds the question; must match the one used at ingest
    pub embed_model: String,
    /// How many chunks to put in the prompt
    pub top_k: usize,
    pub metric: SimilarityMetric,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chat_model: "llama2".to_string(),
            embed_model: "all-minilm".to_string(),
            top_k: 4,
            metric: SimilarityMetric::L2,
        }
    }
}

/// Builds the prompt sent to the model.
///
/// # Examples
///
/// ```
/// use evsearch::answerer::build_prompt;
///
/// let prompt = build_prompt("Which EV has the longest range?", "Model S: 405 miles");
/// assert!(prompt.contains("Question: Which EV has the longest range?"));
/// assert!(prompt.contains("Context: Model S: 405 miles"));
/// assert!(prompt.ends_with("Answer:"));
/// ```
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Use the following pieces of retrieved context to answer the question concisely.\n\n\
         Question: {question}\n\n\
         Context: {context}\n\n\
         Answer:"
    )
}

/// Joins retrieved chunk texts, separated by a blank line, in rank order.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|scored| scored.chunk.content())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Answers questions from the vector index with an Ollama-hosted model.
pub struct RetrievalQa {
    client: Arc<dyn OllamaClientTrait>,
    index: VectorIndex,
    settings: RetrievalSettings,
}

impl RetrievalQa {
    /// Creates a new `RetrievalQa` over an opened index.
    #[must_use]
    pub fn new(
        client: Arc<dyn OllamaClientTrait>,
        index: VectorIndex,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            client,
            index,
            settings,
        }
    }

    /// Embeds `question` and returns the best matching chunks.
    pub fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>, GenerationError> {
        let stored = self
            .index
            .count()
            .map_err(|e| GenerationError::retrieval(&e))?;
        if stored == 0 {
            return Err(GenerationError::EmptyIndex);
        }

        let query = self
            .client
            .embed(&self.settings.embed_model, question)
            .map_err(GenerationError::Embedding)?;

        let chunks = self
            .index
            .similarity_search(&query, self.settings.top_k, self.settings.metric)
            .map_err(|e| GenerationError::retrieval(&e))?;

        debug!(
            stored,
            retrieved = chunks.len(),
            top_score = chunks.first().map(|c| c.score),
            "retrieved context"
        );
        Ok(chunks)
    }
}

impl AnswerAssembler for RetrievalQa {
    fn answer(&self, question: &str) -> Result<String, GenerationError> {
        let chunks = self.retrieve(question)?;
        let prompt = build_prompt(question, &format_context(&chunks));

        info!(model = %self.settings.chat_model, chunks = chunks.len(), "generating answer");
        self.client
            .generate(&self.settings.chat_model, &prompt)
            .map_err(GenerationError::Inference)
    }
}
