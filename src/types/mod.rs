//! Core types used throughout the crate.

pub mod config;
pub mod message;
pub mod prompt;
pub mod streaming;

// Re-export commonly used types
pub use config::*;
pub use message::*;
pub use prompt::*;
pub use streaming::*;
