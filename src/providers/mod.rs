//! Provider implementations for different LLM services.

pub mod openai;

pub use openai::OpenAICompatibleProvider;
