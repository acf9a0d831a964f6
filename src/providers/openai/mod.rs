//! OpenAI-compatible chat completions provider.

pub mod client;
pub mod types;

pub use client::{OpenAICompatibleProvider, DEFAULT_TIMEOUT, GEMINI_OPENAI_BASE_URL};
