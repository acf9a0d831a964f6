use super::types::{
    ApiErrorBody, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, StreamOptions,
};
use crate::provider::LLMProvider;
use crate::sse_stream::SseStreamExt;
use crate::{Error, FinishReason, LLMRequest, Response, StreamEvent};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider for any API that speaks the OpenAI chat completions protocol.
pub struct OpenAICompatibleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    name: String,
}

impl OpenAICompatibleProvider {
    /// Create a provider pointed at Gemini's OpenAI-compatible endpoint.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, GEMINI_OPENAI_BASE_URL.to_string())
    }

    /// Create a provider with a custom base URL.
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        Self::with_timeout(api_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, Error> {
        if api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty"));
        }
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let name = if base_url.contains("generativelanguage.googleapis.com") {
            "Gemini".to_string()
        } else {
            "OpenAI-compatible".to_string()
        };

        Ok(Self {
            client,
            api_key,
            base_url,
            name,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn convert_request(&self, request: &LLMRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stop: request.stop.clone(),
            stream: true,
            stream_options: Some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    /// Convert one streamed chunk into our events.
    fn convert_chunk(chunk: ChatCompletionChunk) -> Vec<StreamEvent> {
        if let Some(error) = chunk.error {
            return vec![StreamEvent::Error {
                error: error.describe(),
            }];
        }

        let mut events = Vec::new();

        // Only the first choice is requested.
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(delta) = choice.delta.content.filter(|d| !d.is_empty()) {
                events.push(StreamEvent::ContentDelta { delta });
            }
            if let Some(reason) = choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: FinishReason::from_api(&reason),
                });
            }
        }
        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::Usage { usage });
        }

        events
    }

    fn status_error(&self, status: StatusCode, model: &str, body: &str) -> Error {
        let message = ApiErrorBody::message_from(body).unwrap_or_else(|| body.trim().to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::auth(message),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimit,
            StatusCode::NOT_FOUND => Error::ModelNotAvailable(model.to_string()),
            _ => Error::provider(&self.name, format!("API error ({status}): {message}")),
        }
    }
}

#[async_trait::async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, request: &LLMRequest) -> Result<Response, Error> {
        let body = self.convert_request(request);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(%url, model = %body.model, messages = body.messages.len(), "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(self.status_error(status, &request.model, &error_text));
        }

        let event_stream = response
            .bytes_stream()
            .sse_events()
            .take_while(|event| {
                let done = matches!(event, Ok(e) if e.is_done());
                async move { !done }
            })
            .filter_map(|event| async move {
                match event {
                    Ok(event) => match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                        Ok(chunk) => Some(Ok(OpenAICompatibleProvider::convert_chunk(chunk))),
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable SSE payload");
                            None
                        }
                    },
                    Err(e) => Some(Err(e)),
                }
            })
            .flat_map(|result| {
                let events = match result {
                    Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                    Err(e) => vec![Err(e)],
                };
                futures_util::stream::iter(events)
            });

        Ok(Response::from_stream(event_stream))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
