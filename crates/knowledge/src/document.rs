//! The document index: one source file, chunked and embedded at startup.

use crate::chunker::chunk_text;
use crate::config::IndexOptions;
use crate::embeddings::EmbeddingProvider;
use crate::types::{DocumentChunk, IndexStats, SearchHit};
use crate::vector_index::{MemoryIndex, VectorIndex};
use chrono::Utc;
use concierge_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Separator placed between passages returned by [`DocumentIndex::retrieve`].
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Immutable nearest-neighbour index over a single text document.
pub struct DocumentIndex {
    provider: Arc<dyn EmbeddingProvider>,
    index: MemoryIndex,
    options: IndexOptions,
    stats: IndexStats,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("stats", &self.stats)
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentIndex {
    /// Read, chunk and embed the document at `path`.
    ///
    /// # Errors
    /// Fails if the file is missing or unreadable, holds no text, or the
    /// embedding provider fails.
    pub async fn load(
        path: &Path,
        provider: Arc<dyn EmbeddingProvider>,
        options: IndexOptions,
    ) -> AppResult<Self> {
        let start = Instant::now();
        options.validate()?;

        if !path.is_file() {
            return Err(AppError::Knowledge(format!(
                "Source document not found: {}",
                path.display()
            )));
        }

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Knowledge(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let candidates = chunk_text(&text, options.chunk_size, options.chunk_overlap)?;
        if candidates.is_empty() {
            return Err(AppError::Knowledge(format!(
                "Source document {} contains no text",
                path.display()
            )));
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;
        if embeddings.len() != candidates.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                candidates.len()
            )));
        }

        let mut index = MemoryIndex::new();
        for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
            index.upsert_chunk(DocumentChunk {
                id: Uuid::new_v4().to_string(),
                position: candidate.position,
                start: candidate.start,
                end: candidate.end,
                text: candidate.text,
                embedding,
            })?;
        }

        let stats = IndexStats {
            path: path.to_path_buf(),
            chunks: index.len(),
            bytes: text.len(),
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
            indexed_at: Utc::now(),
        };

        tracing::info!(
            path = %path.display(),
            chunks = stats.chunks,
            provider = %stats.provider,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Indexed source document"
        );

        Ok(Self {
            provider,
            index,
            options,
            stats,
        })
    }

    /// The `top_k` passages most similar to `query`, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<SearchHit>> {
        let query_embedding = self.provider.embed(query).await?;
        self.index.search(&query_embedding, top_k)
    }

    /// Passages for `query` joined with blank lines, using the configured `top_k`.
    pub async fn retrieve(&self, query: &str) -> AppResult<String> {
        let hits = self.search(query, self.options.top_k).await?;
        tracing::debug!(query = %query, hits = hits.len(), "Retrieved passages");

        Ok(hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR))
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn top_k(&self) -> usize {
        self.options.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use std::fs;
    use tempfile::TempDir;

    fn provider() -> Arc<dyn EmbeddingProvider> {
        Arc::new(TrigramProvider::new(256))
    }

    #[tokio::test]
    async fn test_missing_document_fails() {
        let temp = TempDir::new().unwrap();
        let err = DocumentIndex::load(
            &temp.path().join("missing.txt"),
            provider(),
            IndexOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Source document not found"));
    }

    #[tokio::test]
    async fn test_blank_document_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.txt");
        fs::write(&path, "\n\n   \n").unwrap();

        let err = DocumentIndex::load(&path, provider(), IndexOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("contains no text"));
    }

    #[tokio::test]
    async fn test_stats_describe_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        let first = "Harvest begins in March.".repeat(3);
        let second = "Picnics are welcome on the terrace.".repeat(3);
        fs::write(&path, format!("{}\n\n{}\n", first, second)).unwrap();

        let options = IndexOptions {
            chunk_size: 120,
            chunk_overlap: 0,
            top_k: 1,
        };
        let index = DocumentIndex::load(&path, provider(), options).await.unwrap();

        let stats = index.stats();
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.provider, "trigram");
        assert_eq!(stats.path, path);
        assert_eq!(index.top_k(), 1);

        let passage = index.retrieve("terrace picnics").await.unwrap();
        assert_eq!(passage, second);
    }

    #[tokio::test]
    async fn test_search_returns_at_most_k() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        fs::write(&path, "One para.\n\nTwo para.").unwrap();

        let options = IndexOptions {
            chunk_size: 12,
            chunk_overlap: 0,
            top_k: 4,
        };
        let index = DocumentIndex::load(&path, provider(), options).await.unwrap();

        assert_eq!(index.search("para", 10).await.unwrap().len(), 2);
        assert_eq!(index.search("para", 1).await.unwrap().len(), 1);
    }
}
