//! Types for streaming responses.

use crate::types::{FinishReason, Usage};

/// Events that can be emitted during streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of content was received.
    ContentDelta { delta: String },
    /// Token usage reported by the API (usually on the last chunk).
    Usage { usage: Usage },
    /// The stream has finished.
    Done { finish_reason: FinishReason },
    /// An error occurred during streaming.
    Error { error: String },
}
