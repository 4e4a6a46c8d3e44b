//! Vector index abstraction for document chunks.
//!
//! Defines a trait for vector storage and retrieval plus the in-memory
//! backend the concierge uses (the document is small and built once).

use crate::types::{DocumentChunk, SearchHit};
use concierge_core::{AppError, AppResult};

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a chunk (matched by id).
    fn upsert_chunk(&mut self, chunk: DocumentChunk) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns hits ordered by descending similarity score; ties keep
    /// document order.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of chunks held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force cosine index held in memory.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    chunks: Vec<DocumentChunk>,
    dimensions: Option<usize>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.chunks.iter()
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert_chunk(&mut self, chunk: DocumentChunk) -> AppResult<()> {
        match self.dimensions {
            Some(dims) if dims != chunk.embedding.len() => {
                return Err(AppError::Knowledge(format!(
                    "Embedding dimension mismatch: index has {}, chunk {} has {}",
                    dims,
                    chunk.id,
                    chunk.embedding.len()
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(chunk.embedding.len()),
        }

        match self.chunks.iter_mut().find(|c| c.id == chunk.id) {
            Some(existing) => *existing = chunk,
            None => self.chunks.push(chunk),
        }
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>> {
        if let Some(dims) = self.dimensions {
            if dims != query_embedding.len() {
                return Err(AppError::Knowledge(format!(
                    "Query embedding has {} dimensions, index has {}",
                    query_embedding.len(),
                    dims
                )));
            }
        }

        let mut results: Vec<SearchHit> = self
            .chunks
            .iter()
            .map(|chunk| SearchHit {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        // Sort by score descending (stable, so ties stay in document order)
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
