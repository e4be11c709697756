pub mod answerer;
pub mod config;
pub mod doctor;
pub mod index;
pub mod ingest;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod ollama;
pub mod service;
pub mod session;
pub mod tui;
pub mod utils;

pub use answerer::{AnswerAssembler, GenerationError, RetrievalQa, RetrievalSettings};
pub use config::{Config, ConfigError, ConfigOverrides};
pub use index::{SimilarityMetric, VectorIndex};
pub use keywords::{KeywordFrequency, summarize};
pub use models::{Chunk, ChunkId, LOCATIONS, LocationPoint, ScoredChunk, SessionId};
pub use service::{AskService, Submission};
pub use session::{Session, SessionStore};
