//! LLM integration crate for the concierge.
//!
//! This crate provides a provider-agnostic abstraction for chatting with
//! Large Language Models that can request tool calls. It supports multiple
//! providers through a unified trait-based interface.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use concierge_llm::{ChatMessage, LlmClient, LlmRequest, providers::GeminiClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("api-key", Duration::from_secs(30))?;
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello!")], "gemini-1.5-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role, ToolCall, ToolDeclaration,
};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::{ClientOptions, ProviderType};
