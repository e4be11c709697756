//! Error type for answer generation.

use thiserror::Error;

use crate::ollama::OllamaError;

/// Anything that stops an answer from being produced.
///
/// The message of each variant is what the user sees after `Error: `.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The question could not be embedded
    #[error("embedding failed: {0}")]
    Embedding(#[source] OllamaError),

    /// The vector index could not be read or searched
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The index holds no chunks to retrieve from
    #[error("the vector index is empty (run `evsearch ingest` first)")]
    EmptyIndex,

    /// The language model call failed
    #[error("generation failed: {0}")]
    Inference(#[source] OllamaError),
}

impl GenerationError {
    /// Wraps a storage error, keeping its whole context chain in the message.
    pub fn retrieval(err: &anyhow::Error) -> Self {
        Self::Retrieval(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::error::Error;

    #[test]
    fn inference_error_keeps_source() {
        let err = GenerationError::Inference(OllamaError::Api {
            message: "model 'llama2' not found".to_string(),
        });

        assert_eq!(
            err.to_string(),
            "generation failed: Ollama API error: model 'llama2' not found"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn retrieval_error_includes_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("disk I/O error"));
        let err = inner.context("Failed to read chunk row").unwrap_err();

        let wrapped = GenerationError::retrieval(&err);
        assert_eq!(
            wrapped.to_string(),
            "retrieval failed: Failed to read chunk row: disk I/O error"
        );
    }

    #[test]
    fn empty_index_message_points_at_ingest() {
        assert!(GenerationError::EmptyIndex.to_string().contains("ingest"));
    }
}
