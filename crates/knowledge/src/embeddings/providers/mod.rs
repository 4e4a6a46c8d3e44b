//! Embedding provider implementations.

pub mod gemini;
pub mod trigram;

pub use gemini::GeminiProvider;
pub use trigram::TrigramProvider;
