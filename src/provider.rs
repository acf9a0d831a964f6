use crate::{Error, LLMRequest, Response};

/// A trait for LLM providers that can generate text responses.
/// Responses are streamed; use `response.text().await` for buffered text.
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync + 'static {
    /// Generate a chat completion.
    async fn generate(&self, request: &LLMRequest) -> Result<Response, Error>;

    /// Short provider name used in logs and generated headers.
    fn name(&self) -> &str;
}
