//! Gemini Embedding Provider
//!
//! Provides semantic embeddings via the Generative Language API
//! `batchEmbedContents` endpoint (default model `models/embedding-001`).
//!
//! # Features
//! - Batched requests (up to 100 texts per call)
//! - Automatic retry with exponential backoff on transient failures
//! - Optional dimension check

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use concierge_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum texts per batchEmbedContents call
const MAX_BATCH_SIZE: usize = 100;

/// Maximum attempts per batch
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Gemini embedding provider
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    /// API base URL, up to and including the version segment
    base_url: String,
    api_key: String,
    /// Fully qualified model name ("models/...")
    model: String,
    /// Expected embedding dimensions, if configured
    dimensions: Option<usize>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

/// Failure of one attempt, tagged with whether retrying could help.
struct AttemptError {
    error: AppError,
    transient: bool,
}

impl GeminiProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    /// * `AppError::Knowledge` - If no API key is configured or the HTTP client cannot be built
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Knowledge("Gemini embedding provider requires an API key".to_string())
            })?;

        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            AppError::Knowledge(format!("Failed to create HTTP client for Gemini: {}", e))
        })?;

        let model = if config.model.starts_with("models/") {
            config.model.clone()
        } else {
            format!("models/{}", config.model)
        };

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_GEMINI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model,
            dimensions: config.dimensions,
            timeout: config.timeout,
        })
    }

    /// Embed one batch with retry logic
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;

        loop {
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(failure) => {
                    attempt += 1;
                    if !failure.transient || attempt >= MAX_RETRIES {
                        return Err(failure.error);
                    }

                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, failure.error
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    /// Embed one batch (no retries)
    async fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AttemptError> {
        let url = format!("{}/{}:batchEmbedContents", self.base_url, self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part {
                            text: text.as_str(),
                        }],
                    },
                })
                .collect(),
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError {
                error: if e.is_timeout() {
                    AppError::Timeout(self.timeout)
                } else {
                    AppError::Knowledge(format!("Failed to send request to Gemini: {}", e))
                },
                transient: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AttemptError {
                error: AppError::Knowledge(format!(
                    "Gemini embedding API error ({}): {}",
                    status, error_text
                )),
                transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            });
        }

        let body: BatchEmbedResponse = response.json().await.map_err(|e| AttemptError {
            error: AppError::Knowledge(format!("Failed to parse Gemini response: {}", e)),
            transient: false,
        })?;

        let permanent = |message: String| AttemptError {
            error: AppError::Knowledge(message),
            transient: false,
        };

        if body.embeddings.len() != texts.len() {
            return Err(permanent(format!(
                "Gemini returned {} embeddings for {} texts",
                body.embeddings.len(),
                texts.len()
            )));
        }

        let embeddings: Vec<Vec<f32>> = body.embeddings.into_iter().map(|e| e.values).collect();
        if let Some(expected) = self.dimensions {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(permanent(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    bad.len(),
                    expected
                )));
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(0)
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "gemini"))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            embeddings.extend(self.embed_with_retries(batch).await?);
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMBED_PATH: &str = "/models/embedding-001:batchEmbedContents";

    fn provider(server: &MockServer, dimensions: Option<usize>) -> GeminiProvider {
        GeminiProvider::new(&EmbeddingConfig {
            provider: "gemini".to_string(),
            model: "embedding-001".to_string(),
            dimensions,
            endpoint: Some(server.uri()),
            api_key: Some("test-key".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn embeddings_body(count: usize) -> serde_json::Value {
        let embeddings: Vec<_> = (0..count)
            .map(|i| json!({"values": [i as f32, 1.0, 0.0]}))
            .collect();
        json!({ "embeddings": embeddings })
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "requests": [
                    {"model": "models/embedding-001", "content": {"parts": [{"text": "Malbec"}]}},
                    {"model": "models/embedding-001", "content": {"parts": [{"text": "Tempranillo"}]}}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_body(2)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server, Some(3));
        assert_eq!(provider.model_name(), "models/embedding-001");

        let texts = vec!["Malbec".to_string(), "Tempranillo".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[1], vec![1.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_retries_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_body(1)))
            .mount(&server)
            .await;

        let embedding = provider(&server, None).embed("hours").await.unwrap();
        assert_eq!(embedding.len(), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, None).embed("hours").await.unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_body(1)))
            .mount(&server)
            .await;

        let err = provider(&server, Some(768)).embed("hours").await.unwrap_err();
        assert!(err.to_string().contains("expected 768"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let server = MockServer::start().await;
        let embeddings = provider(&server, None).embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
