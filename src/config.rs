//! Runtime configuration.
//!
//! Each value is resolved from, in order: a command-line override, the process
//! environment, a `.env` file in the working directory, and a built-in default.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::answerer::RetrievalSettings;
use crate::index::SimilarityMetric;
use crate::ollama::{DEFAULT_OLLAMA_HOST, OllamaClient, OllamaClientBuilder, OllamaError};
use crate::utils::get_default_index_path;

pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_CHAT_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_EMBED_MODEL: &str = "OLLAMA_EMBED_MODEL";
pub const ENV_INDEX: &str = "EVSEARCH_INDEX";
pub const ENV_TOP_K: &str = "EVSEARCH_TOP_K";
pub const ENV_METRIC: &str = "EVSEARCH_METRIC";

pub const DEFAULT_CHAT_MODEL: &str = "llama2";
pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";
pub const DEFAULT_TOP_K: usize = 4;

/// Invalid configuration values, reported at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid top-k '{0}': expected a whole number of at least 1")]
    InvalidTopK(String),

    #[error("unknown similarity metric '{0}': expected l2, cosine or dot")]
    UnknownMetric(String),

    #[error("invalid Ollama host '{url}': {reason}")]
    InvalidHost { url: String, reason: String },

    #[error("cannot determine the default index location: {0}")]
    NoDataDirectory(String),
}

/// Values supplied on the command line. `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ollama_host: Option<String>,
    pub chat_model: Option<String>,
    pub embed_model: Option<String>,
    pub index_path: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub metric: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ollama_host: String,
    pub chat_model: String,
    pub embed_model: String,
    pub index_path: PathBuf,
    pub top_k: usize,
    pub metric: SimilarityMetric,
}

impl Config {
    /// Loads `.env`, then resolves every value against the process environment.
    ///
    /// Variables already present in the environment win over `.env` entries.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves configuration with `lookup` standing in for the environment.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use evsearch::config::{Config, ConfigOverrides};
    ///
    /// let overrides = ConfigOverrides {
    ///     top_k: Some(2),
    ///     ..Default::default()
    /// };
    /// let config = Config::resolve(&overrides, |key| match key {
    ///     "OLLAMA_MODEL" => Some("mistral".to_string()),
    ///     "EVSEARCH_TOP_K" => Some("8".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.chat_model, "mistral");
    /// assert_eq!(config.top_k, 2);
    /// ```
    pub fn resolve<F>(overrides: &ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ollama_host = overrides
            .ollama_host
            .clone()
            .or_else(|| env(ENV_OLLAMA_HOST))
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        let ollama_host = ollama_host.trim().trim_end_matches('/').to_string();
        if let Err(e) = reqwest::Url::parse(&ollama_host) {
            return Err(ConfigError::InvalidHost {
                url: ollama_host,
                reason: e.to_string(),
            });
        }

        let chat_model = overrides
            .chat_model
            .clone()
            .or_else(|| env(ENV_CHAT_MODEL))
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let embed_model = overrides
            .embed_model
            .clone()
            .or_else(|| env(ENV_EMBED_MODEL))
            .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string());

        let index_path = match overrides
            .index_path
            .clone()
            .or_else(|| env(ENV_INDEX).map(PathBuf::from))
        {
            Some(path) => path,
            None => get_default_index_path()
                .map_err(|e| ConfigError::NoDataDirectory(e.to_string()))?,
        };

        let top_k = match overrides.top_k {
            Some(k) => k,
            None => match env(ENV_TOP_K) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidTopK(raw.clone()))?,
                None => DEFAULT_TOP_K,
            },
        };
        if top_k == 0 {
            return Err(ConfigError::InvalidTopK(top_k.to_string()));
        }

        let metric = match overrides.metric.clone().or_else(|| env(ENV_METRIC)) {
            Some(raw) => {
                SimilarityMetric::parse(&raw).ok_or(ConfigError::UnknownMetric(raw))?
            }
            None => SimilarityMetric::default(),
        };

        let config = Self {
            ollama_host,
            chat_model,
            embed_model,
            index_path,
            top_k,
            metric,
        };
        debug!(%config, "configuration resolved");
        Ok(config)
    }

    /// Retrieval parameters for the answer assembler.
    pub fn retrieval_settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            chat_model: self.chat_model.clone(),
            embed_model: self.embed_model.clone(),
            top_k: self.top_k,
            metric: self.metric,
        }
    }

    /// Builds an Ollama client pointed at the configured host.
    pub fn ollama_client(&self) -> Result<OllamaClient, OllamaError> {
        OllamaClientBuilder::new()
            .base_url(&self.ollama_host)
            .build()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} model={} embed={} index={} k={} metric={}",
            self.ollama_host,
            self.chat_model,
            self.embed_model,
            self.index_path.display(),
            self.top_k,
            self.metric
        )
    }
}
