//! Chat provider implementations.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use concierge_core::AppError;
use std::time::Duration;

/// Map a transport failure to the error the agent loop reports.
pub(crate) fn send_error(provider: &str, err: reqwest::Error, timeout: Duration) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(timeout)
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}

/// Read a non-success response into an error carrying its body.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::Llm(format!("{} API error ({}): {}", provider, status, error_text))
}
