//! Document retrieval for the concierge.
//!
//! A single source document is read once at startup, split into passages,
//! embedded and held in an in-memory cosine index. Queries are embedded with
//! the same provider and answered with the closest passages.

pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::IndexOptions;
pub use document::{DocumentIndex, PASSAGE_SEPARATOR};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use types::{DocumentChunk, IndexStats, SearchHit};
pub use vector_index::{cosine_similarity, MemoryIndex, VectorIndex};
