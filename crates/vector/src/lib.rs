//! Llego vector search
//!
//! Vector index backends (Qdrant, in-memory), semantic search over stored
//! entities and the bulk vectorization job.

mod entity;
mod index;
mod memory;
mod qdrant;
mod search;
mod similarity;
mod types;
mod vectorize;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use entity::{EntityKind, Vectorizable};
pub use index::VectorIndex;
pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;
pub use search::{SearchHit, SearchThresholds, VectorSearchService, MAX_SEARCH_LIMIT};
pub use similarity::cosine_similarity;
pub use types::{
    point_id, CollectionConfig, Distance, EnsureOutcome, IndexPoint, Payload, ScoredPoint,
    DEFAULT_VECTOR_SIZE,
};
pub use vectorize::{
    BulkVectorizer, ItemError, ItemStage, JobStatus, SkippedItem, VectorizationReport,
};
