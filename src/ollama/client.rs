/// Ollama HTTP client implementation.
///
/// This module provides `OllamaClient` for making synchronous HTTP requests to the Ollama API,
/// along with error types and builder patterns for configuration.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default Ollama endpoint when neither the builder nor `OLLAMA_HOST` provides one.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Errors that can occur when interacting with the Ollama API.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP errors with status code and the body Ollama sent back
    #[error("HTTP error: status {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Ollama API-specific errors
    #[error("Ollama API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use evsearch::ollama::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "http://localhost:11434")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// If `base_url()` was not called, this method will check the `OLLAMA_HOST`
    /// environment variable. If not set, it defaults to `http://localhost:11434`.
    ///
    /// The underlying HTTP client has no request timeout: generation on a local
    /// model can take arbitrarily long and the caller blocks until it returns.
    pub fn build(self) -> Result<OllamaClient, OllamaError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => {
                std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string())
            }
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| OllamaError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(OllamaError::Network)?;

        Ok(OllamaClient { client, base_url })
    }
}

/// Synchronous HTTP client for interacting with the Ollama API.
///
/// It should be constructed using `OllamaClientBuilder`.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

/// Trait for Ollama API client operations.
///
/// This trait enables mocking in unit tests and provides a clean interface
/// for interacting with the Ollama API.
pub trait OllamaClientTrait: Send + Sync {
    /// Generates text for `prompt` with the named model.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError>;

    /// Maps `text` to an embedding vector with the named model.
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, OllamaError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
    error: Option<String>,
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists available models from the Ollama API, sorted by size (largest first).
    ///
    /// Fetches the `/api/tags` endpoint and returns model names.
    pub fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(OllamaError::Network)?;
        let body = read_success_body(response)?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(OllamaError::Serialization)?;

        let mut models: Vec<(String, u64)> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name").and_then(|n| n.as_str())?;
                        let size = model.get("size").and_then(|s| s.as_u64()).unwrap_or(0);
                        Some((name.to_string(), size))
                    })
                    .collect()
            })
            .unwrap_or_default();

        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<String, OllamaError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "calling ollama");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(OllamaError::Network)?;

        read_success_body(response)
    }
}

impl OllamaClientTrait for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let body = self.post_json("/api/generate", &request)?;
        parse_generate_response(&body)
    }

    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, OllamaError> {
        let request = EmbeddingRequest {
            model,
            prompt: text,
        };
        let body = self.post_json("/api/embeddings", &request)?;
        parse_embedding_response(&body)
    }
}

/// Reads the response body, turning non-2xx statuses into `OllamaError::Http`.
fn read_success_body(response: reqwest::blocking::Response) -> Result<String, OllamaError> {
    let status = response.status();
    let body = response.text().map_err(OllamaError::Network)?;
    if !status.is_success() {
        return Err(OllamaError::Http {
            status: status.as_u16(),
            body: extract_error_message(&body),
        });
    }
    Ok(body)
}

/// Pulls the `error` field out of an Ollama error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_generate_response(body: &str) -> Result<String, OllamaError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(OllamaError::Serialization)?;
    if let Some(message) = parsed.error {
        return Err(OllamaError::Api { message });
    }
    parsed.response.ok_or_else(|| OllamaError::Api {
        message: "Missing 'response' field in API response".to_string(),
    })
}

fn parse_embedding_response(body: &str) -> Result<Vec<f32>, OllamaError> {
    let parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(OllamaError::Serialization)?;
    if let Some(message) = parsed.error {
        return Err(OllamaError::Api { message });
    }
    match parsed.embedding {
        Some(embedding) if !embedding.is_empty() => Ok(embedding),
        _ => Err(OllamaError::Api {
            message: "Missing 'embedding' field in API response".to_string(),
        }),
    }
}
