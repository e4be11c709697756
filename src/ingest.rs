//! Builds the vector index from plain text files.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::index::VectorIndex;
use crate::ollama::OllamaClientTrait;

/// Largest chunk, in characters, that paragraphs are merged up to.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Paragraphs (separated by blank lines) are merged greedily, joined with a
/// blank line, as long as the result fits. A paragraph longer than `max_chars`
/// is cut on character boundaries. Whitespace-only paragraphs are dropped.
///
/// # Examples
///
/// ```
/// use evsearch::ingest::chunk_text;
///
/// let chunks = chunk_text("one\n\ntwo\n\n\nthree", 8);
/// assert_eq!(chunks, vec!["one\n\ntwo", "three"]);
/// ```
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in paragraphs(text) {
        let len = paragraph.chars().count();

        if len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(split_chars(paragraph, max_chars));
            continue;
        }

        let joined_len = if current.is_empty() {
            len
        } else {
            current_len + 2 + len
        };
        if joined_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Paragraphs of `text`, trimmed, with empty ones skipped.
fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut previous_blank = false;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if blank && !previous_blank {
            paragraphs.push(&text[start..offset]);
        }
        if !blank && previous_blank {
            start = offset;
        }
        previous_blank = blank;
        offset += line.len();
    }
    if !previous_blank {
        paragraphs.push(&text[start..]);
    }

    paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn split_chars(paragraph: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect::<String>())
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Chunks, embeds and stores one file. Returns the number of chunks stored.
///
/// Chunks already stored for the file are replaced. Nothing is written unless
/// every chunk was embedded.
pub fn ingest_file(
    client: &dyn OllamaClientTrait,
    embed_model: &str,
    index: &mut VectorIndex,
    path: &Path,
) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = path.display().to_string();

    let chunks = chunk_text(&text, DEFAULT_CHUNK_CHARS);
    debug!(%source, chunks = chunks.len(), "chunked file");

    let mut embedded = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.into_iter().enumerate() {
        let embedding = client
            .embed(embed_model, &chunk)
            .with_context(|| format!("Failed to embed chunk {} of {source}", i + 1))?;
        embedded.push((chunk, embedding));
    }

    let stored = index
        .replace_source(&source, &embedded)
        .with_context(|| format!("Failed to store chunks of {source}"))?;

    info!(%source, stored, "ingested file");
    Ok(stored)
}
