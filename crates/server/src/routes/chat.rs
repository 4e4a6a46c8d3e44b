use crate::context::AppContext;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub const NO_MESSAGE: &str = "No message provided.";
pub const APOLOGY: &str = "Sorry, an error occurred while processing your request.";

/// Body of every `/chat` reply, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

/// The body is read raw so that malformed JSON gets the same 400 as a missing message.
pub async fn chat_handler(
    State(context): State<Arc<AppContext>>,
    body: Bytes,
) -> (StatusCode, Json<ChatResponse>) {
    let Some(message) = extract_message(&body) else {
        tracing::warn!(bytes = body.len(), "Rejecting /chat request without a message");
        return (StatusCode::BAD_REQUEST, Json(ChatResponse::new(NO_MESSAGE)));
    };

    tracing::info!(chars = message.chars().count(), "Received /chat request");
    let started = Instant::now();

    match context.agent().answer(&message).await {
        Ok(answer) => {
            tracing::info!(
                latency_ms = started.elapsed().as_millis() as u64,
                "Chat request answered"
            );
            (StatusCode::OK, Json(ChatResponse::new(answer)))
        }
        Err(error) => {
            tracing::error!(%error, "Agent run failed");
            let status = if context.surface_agent_errors() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::OK
            };
            (status, Json(ChatResponse::new(APOLOGY)))
        }
    }
}

/// The `message` string of a JSON object body, if present and not blank.
fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?;
    if message.trim().is_empty() {
        return None;
    }
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(br#"{"message": "Are you open on Sunday?"}"#).as_deref(),
            Some("Are you open on Sunday?")
        );
        assert_eq!(extract_message(br#"{}"#), None);
        assert_eq!(extract_message(br#"{"message": ""}"#), None);
        assert_eq!(extract_message(br#"{"message": "   "}"#), None);
        assert_eq!(extract_message(br#"{"message": 5}"#), None);
        assert_eq!(extract_message(br#"{"message": null}"#), None);
        assert_eq!(extract_message(br#"["message"]"#), None);
        assert_eq!(extract_message(b"message=hello"), None);
        assert_eq!(extract_message(b""), None);
    }
}
