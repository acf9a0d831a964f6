//! Generate runnable Dash dashboard scripts from a CSV file and a natural-language prompt.
//!
//! The pipeline is sequential: preview the dataset, assemble the prompt, make one call to an
//! OpenAI-compatible chat API (Gemini by default), clean up the reply and write it to disk.

pub mod accumulator;
pub mod cli;
pub mod error;
pub mod factory;
pub mod generator;
pub mod output;
pub mod postprocess;
pub mod preview;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod types;

// Re-export core types for easy usage
pub use error::Error;
pub use factory::{ConfigOverrides, GeneratorConfig, ProviderFactory};
pub use generator::{DashboardGenerator, GeneratedDashboard};
pub use provider::LLMProvider;
pub use providers::*;
pub use response::*;
pub use sse_stream::SseEvent;
pub use types::*;
