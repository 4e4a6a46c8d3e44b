//! Embedding provider configuration.

use concierge_core::config::EmbeddingSettings;
use std::time::Duration;

/// Everything needed to construct an embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "gemini" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected embedding dimensions (checked when set)
    pub dimensions: Option<usize>,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Upper bound on a single embedding request
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: None,
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EmbeddingConfig {
    /// Build from application settings plus the secret and timeout that live elsewhere.
    pub fn from_settings(
        settings: &EmbeddingSettings,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            endpoint: settings.endpoint.clone(),
            api_key: api_key.map(str::to_string),
            timeout,
        }
    }
}
