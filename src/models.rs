mod chunk;
mod ids;
mod location;

pub use chunk::{Chunk, ScoredChunk};
pub use ids::{ChunkId, SessionId};
pub use location::{LOCATIONS, LocationPoint, view_center};
