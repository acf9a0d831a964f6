//! Response handling for LLM generations.

use crate::accumulator::ResponseAccumulator;
use crate::{Error, FinishReason, StreamEvent, Usage};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

/// A complete, buffered response from an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// Response from an LLM generation that can be streamed or buffered.
pub struct Response {
    stream: EventStream,
}

impl Response {
    /// Create a new response from a stream of events.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent, Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Buffer the entire response by consuming the stream.
    pub async fn buffer(mut self) -> Result<CompleteResponse, Error> {
        let mut accumulator = ResponseAccumulator::new();

        // Usage can trail the finish chunk, so drain until the stream closes.
        while let Some(event) = self.stream.next().await {
            accumulator.process_event(event?)?;
        }

        accumulator.finalize()
    }

    /// Get just the text content.
    pub async fn text(self) -> Result<String, Error> {
        Ok(self.buffer().await?.content)
    }
}
