use serde::Serialize;

use super::ChunkId;

/// A piece of source text stored in the vector index with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    id: ChunkId,
    /// Where the text came from (usually the ingested file path).
    source: String,
    content: String,
    #[serde(skip)]
    embedding: Vec<f32>,
}

impl Chunk {
    /// Creates a chunk from its stored parts.
    pub fn new(
        id: ChunkId,
        source: impl Into<String>,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            content: content.into(),
            embedding,
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }
}

/// A chunk returned by a similarity search, with the score it ranked by.
///
/// Higher scores are always more similar, whatever metric produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
