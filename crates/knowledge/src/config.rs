//! Document index build options.

use concierge_core::config::KnowledgeSettings;
use concierge_core::{AppError, AppResult};

/// Chunking and retrieval parameters for a [`crate::DocumentIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Maximum chunk length in bytes
    pub chunk_size: usize,

    /// Bytes shared by consecutive windows of an oversized paragraph
    pub chunk_overlap: usize,

    /// Passages returned by [`crate::DocumentIndex::retrieve`]
    pub top_k: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
            top_k: 4,
        }
    }
}

impl From<&KnowledgeSettings> for IndexOptions {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            top_k: settings.top_k,
        }
    }
}

impl IndexOptions {
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Knowledge("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Knowledge(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(AppError::Knowledge("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_valid() {
        assert!(IndexOptions::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        let options = IndexOptions {
            chunk_size: 64,
            chunk_overlap: 64,
            top_k: 4,
        };
        assert!(options.validate().is_err());
    }
}
