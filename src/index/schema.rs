/// Schema for the on-disk vector index.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// Embeddings are stored as little-endian `f32` blobs with their length in
/// `dimension` so a mismatched query can be rejected without decoding.
pub const INITIAL_SCHEMA: &str = r#"
-- Chunks table: one row per embedded piece of source text
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY,
    source TEXT NOT NULL,
    content TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
);

-- Index for per-source statistics
CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;
