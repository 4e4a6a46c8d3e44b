//! Offline embedding provider built from word and character-trigram hashes.

use crate::embeddings::provider::EmbeddingProvider;
use concierge_core::AppResult;
use std::collections::HashMap;

/// Default vector width for trigram embeddings.
pub const DEFAULT_TRIGRAM_DIMENSIONS: usize = 384;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "you", "your", "our", "we", "what", "when", "how",
    "do", "does", "can",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Vectors are deterministic and content-dependent: texts that share words
/// (after lowercasing, stripping punctuation and dropping stop words) land
/// close together under cosine similarity. Not semantic, but enough to rank
/// passages of a small document without network access.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let mut word_freq: HashMap<String, u32> = HashMap::new();
        for word in tokenize(text) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let freq = *freq as f32;
            embedding[self.bucket(word.as_bytes(), 31)] += freq;

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(trigram.as_bytes(), 37)] += freq.sqrt();
            }
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

/// Lowercased alphanumeric words longer than two characters, minus stop words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::cosine_similarity;

    #[tokio::test]
    async fn test_trigram_provider_metadata() {
        let provider = TrigramProvider::new(DEFAULT_TRIGRAM_DIMENSIONS);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_embeddings_are_unit_length() {
        let provider = TrigramProvider::new(128);
        let texts = vec![
            "Our tasting room opens at 11am".to_string(),
            "Tempranillo aged in French oak".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 128);
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.001);
        }
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(384);
        let first = provider.embed("Vineyard tours daily").await.unwrap();
        let second = provider.embed("Vineyard tours daily").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_punctuation_and_case_ignored() {
        let provider = TrigramProvider::new(384);
        let plain = provider.embed("tasting hours").await.unwrap();
        let noisy = provider.embed("Tasting HOURS?!").await.unwrap();
        assert_eq!(plain, noisy);
    }

    #[tokio::test]
    async fn test_shared_words_rank_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("When is the tasting room open?").await.unwrap();
        let hours = provider
            .embed("The tasting room is open Thursday to Sunday.")
            .await
            .unwrap();
        let wine = provider
            .embed("Our reserve Malbec rests eighteen months in barrel.")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &hours) > cosine_similarity(&query, &wine));
    }

    #[tokio::test]
    async fn test_stop_words_only_gives_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("the and of").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("Viñedos del sol, añejo 🍷").await.unwrap();
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }
}
