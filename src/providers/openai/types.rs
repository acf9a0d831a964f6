use crate::types::Usage;
use serde::{Deserialize, Serialize};

/// Message in a chat completions request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ask the API to attach usage to the final streamed chunk.
#[derive(Debug, Clone, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// OpenAI-compatible chat completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// One `data:` payload of a streamed chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Set when the API fails after the stream has started.
    #[serde(default)]
    pub error: Option<ApiErrorDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body returned by OpenAI-compatible APIs. Gemini wraps it in a one-element array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Single(ApiErrorEnvelope),
    List(Vec<ApiErrorEnvelope>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    pub message: String,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorDetails {
    /// The message, tagged with the API's status name when it sent one.
    pub fn describe(&self) -> String {
        match &self.status {
            Some(status) => format!("{} ({status})", self.message),
            None => self.message.clone(),
        }
    }
}

impl ApiErrorBody {
    /// Extract the human-readable message from a raw error body, if it parses.
    pub fn message_from(body: &str) -> Option<String> {
        match serde_json::from_str::<ApiErrorBody>(body).ok()? {
            ApiErrorBody::Single(envelope) => Some(envelope.error.message),
            ApiErrorBody::List(list) => list.into_iter().next().map(|e| e.error.message),
        }
    }
}
