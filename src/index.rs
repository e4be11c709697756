//! SQLite-backed vector index.
//!
//! Stores chunk text with its embedding and answers top-k similarity queries
//! by scanning every row. The answering path opens the file read-only; only
//! ingestion writes to it.

mod schema;


use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::debug;

use crate::models::{Chunk, ChunkId, ScoredChunk};
use schema::INITIAL_SCHEMA;

/// How query and chunk embeddings are compared.
///
/// Every metric is turned into a score where higher means more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMetric {
    /// Negated Euclidean distance.
    #[default]
    L2,
    /// Cosine of the angle between the vectors.
    Cosine,
    /// Raw inner product.
    Dot,
}

impl SimilarityMetric {
    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "l2" | "euclidean" => Some(Self::L2),
            "cosine" => Some(Self::Cosine),
            "dot" | "ip" => Some(Self::Dot),
            _ => None,
        }
    }

    /// Scores `candidate` against `query`. Both must have the same length.
    pub fn score(self, query: &[f32], candidate: &[f32]) -> f32 {
        match self {
            Self::L2 => {
                let sum: f32 = query
                    .iter()
                    .zip(candidate)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                -sum.sqrt()
            }
            Self::Cosine => cosine_similarity(query, candidate),
            Self::Dot => query.iter().zip(candidate).map(|(a, b)| a * b).sum(),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => write!(f, "l2"),
            Self::Cosine => write!(f, "cosine"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Encodes an embedding as little-endian `f32` bytes.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes a blob written by `encode_embedding`.
fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        bail!("corrupt embedding blob of {} bytes", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Vector index wrapper providing connection management, writes and search.
pub struct VectorIndex {
    conn: Connection,
}

impl VectorIndex {
    /// Opens an in-memory index.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Self { conn };
        index.initialize_schema()?;
        Ok(index)
    }

    /// Opens a file-based index for writing at the given path.
    ///
    /// Creates the file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let index = Self { conn };
        index.initialize_schema()?;
        Ok(index)
    }

    /// Opens an existing index file without write access.
    ///
    /// Fails if the file is missing or was never initialized as an index.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!(
                "vector index not found at {} (run `evsearch ingest` to build it)",
                path.display()
            );
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open vector index {}", path.display()))?;

        let has_chunks: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='chunks')",
            [],
            |row| row.get(0),
        )?;
        if !has_chunks {
            bail!("{} is not a vector index (no chunks table)", path.display());
        }

        debug!(path = %path.display(), "opened vector index read-only");
        Ok(Self { conn })
    }

    /// Initializes the index schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Stores one chunk and returns its ID.
    ///
    /// Every chunk in an index must share one embedding dimension.
    pub fn insert_chunk(&self, source: &str, content: &str, embedding: &[f32]) -> Result<ChunkId> {
        insert_row(&self.conn, source, content, embedding)
    }

    /// Replaces every chunk stored for `source` with `chunks`.
    ///
    /// Runs in one transaction: on any error the index keeps its previous rows.
    /// Returns the number of chunks stored.
    pub fn replace_source(&mut self, source: &str, chunks: &[(String, Vec<f32>)]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let removed = tx
            .execute("DELETE FROM chunks WHERE source = ?1", [source])
            .with_context(|| format!("Failed to remove old chunks of {source}"))?;
        for (content, embedding) in chunks {
            insert_row(&tx, source, content, embedding)?;
        }

        tx.commit()?;
        debug!(source, removed, stored = chunks.len(), "replaced source");
        Ok(chunks.len())
    }

    /// Number of chunks stored.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Embedding dimension of the stored chunks, or `None` for an empty index.
    pub fn dimension(&self) -> Result<Option<usize>> {
        stored_dimension(&self.conn)
    }

    /// Chunk counts per source, largest first.
    pub fn sources(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) FROM chunks GROUP BY source ORDER BY COUNT(*) DESC, source",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row.context("Failed to read source row")?);
        }
        Ok(sources)
    }

    /// Returns the `k` chunks most similar to `query` under `metric`, best first.
    pub fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if let Some(dimension) = self.dimension()?
            && dimension != query.len()
        {
            bail!(
                "query embedding has {} dimensions but the index stores {}",
                query.len(),
                dimension
            );
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, source, content, embedding FROM chunks ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, source, content, blob) = row.context("Failed to read chunk row")?;
            let embedding = decode_embedding(&blob)
                .with_context(|| format!("chunk {id} has a corrupt embedding"))?;
            let score = metric.score(query, &embedding);
            scored.push(ScoredChunk {
                chunk: Chunk::new(ChunkId::new(id), source, content, embedding),
                score,
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        debug!(k, %metric, returned = scored.len(), "similarity search");
        Ok(scored)
    }
}

fn stored_dimension(conn: &Connection) -> Result<Option<usize>> {
    let dimension: Option<i64> = conn
        .query_row("SELECT dimension FROM chunks LIMIT 1", [], |row| row.get(0))
        .optional()?;
    Ok(dimension.map(|d| d as usize))
}

fn insert_row(conn: &Connection, source: &str, content: &str, embedding: &[f32]) -> Result<ChunkId> {
    if embedding.is_empty() {
        bail!("cannot store a chunk with an empty embedding");
    }
    if let Some(dimension) = stored_dimension(conn)?
        && dimension != embedding.len()
    {
        bail!(
            "embedding has {} dimensions but the index stores {}",
            embedding.len(),
            dimension
        );
    }

    conn.execute(
        "INSERT INTO chunks (source, content, dimension, embedding) VALUES (?1, ?2, ?3, ?4)",
        params![
            source,
            content,
            embedding.len() as i64,
            encode_embedding(embedding)
        ],
    )
    .context("Failed to insert chunk")?;

    Ok(ChunkId::new(conn.last_insert_rowid()))
}
