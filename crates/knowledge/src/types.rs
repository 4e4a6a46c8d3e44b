//! Document index type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A passage of the source document with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Position within the document (0-based)
    pub position: u32,

    /// Byte offset where the passage starts
    pub start: usize,

    /// Byte offset one past the end of the passage
    pub end: usize,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: DocumentChunk,

    /// Cosine similarity in `[-1.0, 1.0]`
    pub score: f32,
}

/// Statistics about a loaded document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Source document path
    pub path: PathBuf,

    /// Number of chunks in the index
    pub chunks: usize,

    /// Source size in bytes
    pub bytes: usize,

    /// Embedding provider used to build the index
    pub provider: String,

    /// Embedding model used to build the index
    pub model: String,

    /// When the index was built
    pub indexed_at: DateTime<Utc>,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCandidate {
    pub position: u32,
    pub start: usize,
    pub end: usize,
    pub text: String,
}
