//! Text chunking with configurable size and overlap.
//!
//! Splitting is delegated to `text-splitter`, which prefers paragraph, then
//! sentence, then word boundaries while keeping each chunk within
//! `chunk_size` characters.

use crate::types::ChunkCandidate;
use concierge_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk text into passages of at most `chunk_size` characters.
///
/// # Errors
/// Fails if `overlap` is not smaller than `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<ChunkCandidate>> {
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Knowledge(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<ChunkCandidate> = splitter
        .chunk_indices(text)
        .filter(|(_, chunk)| !chunk.trim().is_empty())
        .enumerate()
        .map(|(position, (start, chunk))| ChunkCandidate {
            position: position as u32,
            start,
            end: start + chunk.len(),
            text: chunk.to_string(),
        })
        .collect();

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}
