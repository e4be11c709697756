//! Retrieval-augmented question answering.
//!
//! This module provides `RetrievalQa`, which embeds a question, pulls the closest
//! chunks from the vector index and asks an Ollama-hosted model to answer from them.

mod error;
mod retrieval_qa;

pub use error::GenerationError;
pub use retrieval_qa::{
    AnswerAssembler, RetrievalQa, RetrievalSettings, build_prompt, format_context,
};
