use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use evsearch::config::{Config, ConfigError, ConfigOverrides};
use evsearch::index::VectorIndex;
use evsearch::ingest::ingest_file;
use evsearch::keywords::KeywordFrequency;
use evsearch::models::SessionId;
use evsearch::ollama::OllamaClientTrait;
use evsearch::service::{AskService, EMPTY_QUESTION_MESSAGE, Submission};
use evsearch::session::Session;
use evsearch::{doctor, logging, tui, utils};

const HEALTH_CHECKS_FAILED: &str = "one or more health checks failed";

/// evsearch - ask questions over a local document index with an Ollama model
#[derive(Parser)]
#[command(name = "evsearch")]
#[command(about = "Retrieval-augmented question answering over a local vector index")]
#[command(version)]
struct Cli {
    /// Ollama base URL [env: OLLAMA_HOST]
    #[arg(long, global = true, value_name = "URL")]
    ollama_host: Option<String>,

    /// Model that writes answers [env: OLLAMA_MODEL]
    #[arg(long, global = true, value_name = "MODEL")]
    model: Option<String>,

    /// Model that embeds questions and chunks [env: OLLAMA_EMBED_MODEL]
    #[arg(long, global = true, value_name = "MODEL")]
    embed_model: Option<String>,

    /// Vector index file [env: EVSEARCH_INDEX]
    #[arg(long, global = true, value_name = "PATH")]
    index: Option<PathBuf>,

    /// Number of chunks retrieved per question [env: EVSEARCH_TOP_K]
    #[arg(long, global = true, value_name = "K")]
    top_k: Option<usize>,

    /// Similarity metric: l2, cosine or dot [env: EVSEARCH_METRIC]
    #[arg(long, global = true, value_name = "METRIC")]
    metric: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ollama_host: self.ollama_host.clone(),
            chat_model: self.model.clone(),
            embed_model: self.embed_model.clone(),
            index_path: self.index.clone(),
            top_k: self.top_k,
            metric: self.metric.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI (default)
    Ui,
    /// Answer one question and print the keyword frequencies
    Ask(AskCommand),
    /// Chunk, embed and store text files in the vector index
    Ingest(IngestCommand),
    /// Check the vector index and Ollama
    Doctor,
}

/// Answer a single question
#[derive(Parser)]
struct AskCommand {
    /// The question to ask
    #[arg(value_name = "QUESTION")]
    question: String,
}

/// Add documents to the index
#[derive(Parser)]
struct IngestCommand {
    /// UTF-8 text files to ingest
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // Held until exit so buffered log lines are flushed
    let _log_guard = match utils::get_log_directory().and_then(|dir| logging::init_logging(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    let result = Config::load(&cli.overrides())
        .map_err(anyhow::Error::from)
        .and_then(|config| run(&cli, &config));

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        tracing::error!(error = %format!("{e:#}"), exit_code, "command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        None | Some(Commands::Ui) => tui::run(config),
        Some(Commands::Ask(cmd)) => handle_ask(config, &cmd.question),
        Some(Commands::Ingest(cmd)) => handle_ingest(config, &cmd.paths),
        Some(Commands::Doctor) => handle_doctor(config),
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include bad configuration, a missing index and empty questions.
/// Internal errors include model failures, database failures and I/O errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error
        .chain()
        .any(|cause| cause.downcast_ref::<ConfigError>().is_some())
    {
        return true;
    }

    let error_msg = format!("{error:#}");
    error_msg.contains("vector index not found")
        || error_msg.contains("is not a vector index")
        || error_msg.contains(EMPTY_QUESTION_MESSAGE)
        || error_msg.contains(HEALTH_CHECKS_FAILED)
}

/// Handles the ask command by answering one question against the index.
fn handle_ask(config: &Config, question: &str) -> Result<()> {
    // Checked before the index is opened so an empty question never needs one
    if question.trim().is_empty() {
        bail!(EMPTY_QUESTION_MESSAGE);
    }

    let service = tui::build_service(config)?;
    execute_ask(&service, question, &mut io::stdout().lock())
}

/// Executes the ask command logic with a provided service.
///
/// This function is separated from `handle_ask` to allow testing with stub assemblers.
fn execute_ask(service: &AskService, question: &str, out: &mut impl Write) -> Result<()> {
    let mut session = Session::new(SessionId::new(1));

    match service.submit(&mut session, question) {
        Submission::Answered { answer, keywords } => {
            writeln!(out, "{answer}")?;
            if !keywords.is_empty() {
                writeln!(out)?;
                write_keyword_table(out, &keywords)?;
            }
            Ok(())
        }
        Submission::Invalid => bail!(EMPTY_QUESTION_MESSAGE),
        Submission::Failed(message) => bail!(message),
    }
}

/// Prints keywords and their counts as two aligned columns.
fn write_keyword_table(out: &mut impl Write, keywords: &[KeywordFrequency]) -> io::Result<()> {
    let width = keywords
        .iter()
        .map(|k| k.keyword.chars().count())
        .max()
        .unwrap_or(0)
        .max("Keywords".len());

    writeln!(out, "{:<width$}  Frequency", "Keywords")?;
    for k in keywords {
        writeln!(out, "{:<width$}  {}", k.keyword, k.count)?;
    }
    Ok(())
}

/// Handles the ingest command by populating the index from text files.
fn handle_ingest(config: &Config, paths: &[PathBuf]) -> Result<()> {
    utils::ensure_parent_directory(&config.index_path)?;
    let mut index =
        VectorIndex::open(&config.index_path).context("Failed to open vector index")?;
    let client = config
        .ollama_client()
        .context("Failed to create Ollama client")?;

    execute_ingest(
        &client,
        &config.embed_model,
        &mut index,
        paths,
        &mut io::stdout().lock(),
    )
}

/// Executes the ingest command logic with a provided client and index.
fn execute_ingest(
    client: &dyn OllamaClientTrait,
    embed_model: &str,
    index: &mut VectorIndex,
    paths: &[PathBuf],
    out: &mut impl Write,
) -> Result<()> {
    for path in paths {
        let stored = ingest_file(client, embed_model, index, path)?;
        writeln!(out, "{}: {} chunks", path.display(), stored)?;
    }
    writeln!(out, "Index now holds {} chunks", index.count()?)?;
    Ok(())
}

/// Handles the doctor command.
fn handle_doctor(config: &Config) -> Result<()> {
    if !doctor::run_health_checks(config) {
        bail!(HEALTH_CHECKS_FAILED);
    }
    Ok(())
}
