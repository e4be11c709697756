//! Health checks for the `doctor` command.
//!
//! Verifies that the vector index exists and holds chunks, and that Ollama is
//! reachable with both the chat and embedding models installed.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::Config;
use crate::index::VectorIndex;

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HealthStatus::Error(_))
    }
}

/// Vector index health information.
#[derive(Debug)]
pub struct IndexHealth {
    pub status: HealthStatus,
    pub file_path: String,
    pub chunks: usize,
    pub dimension: Option<usize>,
    pub sources: Vec<(String, usize)>,
}

/// Ollama connectivity information.
#[derive(Debug)]
pub struct OllamaHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub models: Vec<String>,
}

/// Runs every check and prints the report.
///
/// Returns `false` when any component is in an error state.
pub fn run_health_checks(config: &Config) -> bool {
    let index = check_index_health(&config.index_path);
    let ollama = check_ollama_health(config);

    print!("{}", render_health_report(&index, &ollama));
    !index.status.is_error() && !ollama.status.is_error()
}

/// Opens the index read-only and collects its statistics.
pub fn check_index_health(path: &Path) -> IndexHealth {
    let mut health = IndexHealth {
        status: HealthStatus::Ok,
        file_path: path.display().to_string(),
        chunks: 0,
        dimension: None,
        sources: Vec::new(),
    };

    let index = match VectorIndex::open_read_only(path) {
        Ok(index) => index,
        Err(e) => {
            health.status = HealthStatus::Error(format!("{e:#}"));
            return health;
        }
    };

    let stats = index
        .count()
        .and_then(|count| Ok((count, index.dimension()?, index.sources()?)));
    match stats {
        Ok((chunks, dimension, sources)) => {
            health.chunks = chunks;
            health.dimension = dimension;
            health.sources = sources;
            if chunks == 0 {
                health.status =
                    HealthStatus::Warning("Index is empty (run `evsearch ingest`)".to_string());
            }
        }
        Err(e) => health.status = HealthStatus::Error(format!("Query failed: {e:#}")),
    }
    health
}

fn check_ollama_health(config: &Config) -> OllamaHealth {
    let client = match config.ollama_client() {
        Ok(c) => c,
        Err(e) => {
            return OllamaHealth {
                status: HealthStatus::Error(format!("Failed to build client: {}", e)),
                base_url: config.ollama_host.clone(),
                models: Vec::new(),
            };
        }
    };

    let base_url = client.base_url().to_string();

    match client.list_models() {
        Ok(models) => OllamaHealth {
            status: required_models_status(
                &models,
                &[config.chat_model.as_str(), config.embed_model.as_str()],
            ),
            base_url,
            models,
        },
        Err(e) => OllamaHealth {
            status: HealthStatus::Error(format!("Connection failed: {}", e)),
            base_url,
            models: Vec::new(),
        },
    }
}

/// Whether `name` is among `installed`, where a bare name matches its `:latest` tag.
fn model_installed(installed: &[String], name: &str) -> bool {
    installed.iter().any(|model| {
        model == name || (!name.contains(':') && model.strip_suffix(":latest") == Some(name))
    })
}

/// Error when any of `required` is missing from `installed`.
pub fn required_models_status(installed: &[String], required: &[&str]) -> HealthStatus {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !model_installed(installed, name))
        .collect();

    if missing.is_empty() {
        HealthStatus::Ok
    } else {
        HealthStatus::Error(format!(
            "Missing models: {} (run `ollama pull <model>`)",
            missing.join(", ")
        ))
    }
}

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok: &str) -> String {
    match status {
        HealthStatus::Ok => ok.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

/// Formats the coloured report printed by `doctor`.
pub fn render_health_report(index: &IndexHealth, ollama: &OllamaHealth) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}evsearch doctor{}", BOLD, RESET);
    let _ = writeln!(out);

    // Index section
    let _ = writeln!(out, "{}Vector index{}", BOLD, RESET);
    let _ = writeln!(
        out,
        "  {}{}{} Status: {}",
        status_color(&index.status),
        status_symbol(&index.status),
        RESET,
        status_text(&index.status, "OK")
    );
    let _ = writeln!(out, "    {}Path: {}{}", DIM, index.file_path, RESET);
    if !index.status.is_error() {
        let _ = writeln!(out, "    Chunks:    {:>6}", index.chunks);
        if let Some(dimension) = index.dimension {
            let _ = writeln!(out, "    Dimension: {:>6}", dimension);
        }
        for (source, count) in &index.sources {
            let _ = writeln!(out, "    {}{:>6}  {}{}", DIM, count, source, RESET);
        }
    }
    let _ = writeln!(out);

    // Ollama section
    let _ = writeln!(out, "{}Ollama{}", BOLD, RESET);
    let _ = writeln!(
        out,
        "  {}{}{} Status: {}",
        status_color(&ollama.status),
        status_symbol(&ollama.status),
        RESET,
        status_text(&ollama.status, "Connected")
    );
    if !ollama.base_url.is_empty() {
        let _ = writeln!(out, "    {}URL: {}{}", DIM, ollama.base_url, RESET);
    }
    if !ollama.models.is_empty() {
        let models_display = if ollama.models.len() > 3 {
            format!(
                "{}, ... ({} more)",
                ollama.models[..3].join(", "),
                ollama.models.len() - 3
            )
        } else {
            ollama.models.join(", ")
        };
        let _ = writeln!(out, "    {}Models: {}{}", DIM, models_display, RESET);
    }
    out
}
