/// Ollama HTTP client module.
///
/// This module provides a blocking HTTP client for the Ollama text generation and
/// embedding endpoints, with error types and builder-based configuration.
mod client;

pub use client::{
    DEFAULT_OLLAMA_HOST, OllamaClient, OllamaClientBuilder, OllamaClientTrait, OllamaError,
};
