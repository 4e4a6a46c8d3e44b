//! LLM provider factory.
//!
//! This module provides a factory for creating chat clients based on
//! application configuration.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::{ClientOptions, ProviderType};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `options` - Endpoint, API key and timeout
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - Required secrets are missing
/// - Client initialization fails
pub fn create_client(
    provider: &str,
    options: &ClientOptions,
) -> Result<Arc<dyn LlmClient>, String> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Gemini) => {
            let api_key = options
                .api_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| "Gemini provider requires API key".to_string())?;
            let client = match options.endpoint.as_deref() {
                Some(endpoint) => GeminiClient::with_base_url(endpoint, api_key, options.timeout),
                None => GeminiClient::new(api_key, options.timeout),
            }
            .map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        Some(ProviderType::Ollama) => {
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(OllamaClient::DEFAULT_URL);
            let client =
                OllamaClient::with_timeout(base_url, options.timeout).map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        None => Err(format!("Unknown provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_gemini_client() {
        let options = ClientOptions::default().with_api_key("test-key");
        let client = create_client("gemini", &options).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client("gemini", &ClientOptions::default()) {
            Err(err) => assert!(err.contains("Gemini provider requires API key")),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
