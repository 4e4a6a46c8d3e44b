//! Prompt system for the concierge.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in defaults that a workspace can override
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, load_prompt, resolve_prompt, SYSTEM_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
