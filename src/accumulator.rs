//! Delta accumulation logic for streaming responses.

use crate::response::CompleteResponse;
use crate::types::{FinishReason, StreamEvent, Usage};
use crate::Error;

/// Accumulates streaming deltas into a complete response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    content: String,
    /// Final finish reason (if received).
    finish_reason: Option<FinishReason>,
    /// Final usage statistics (if received).
    usage: Option<Usage>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a stream event and update the accumulation.
    pub fn process_event(&mut self, event: StreamEvent) -> Result<(), Error> {
        match event {
            StreamEvent::ContentDelta { delta } => {
                self.content.push_str(&delta);
            }
            StreamEvent::Usage { usage } => {
                self.usage = Some(usage);
            }
            StreamEvent::Done { finish_reason } => {
                self.finish_reason = Some(finish_reason);
            }
            StreamEvent::Error { error } => {
                return Err(Error::streaming(error));
            }
        }

        Ok(())
    }

    /// Text received so far.
    pub fn current_content(&self) -> &str {
        &self.content
    }

    /// Finalize and return the complete response.
    ///
    /// A stream that closed without a finish reason was cut off, so its content is not returned.
    pub fn finalize(self) -> Result<CompleteResponse, Error> {
        let finish_reason = self.finish_reason.ok_or_else(|| {
            Error::streaming(format!(
                "stream ended before the model finished ({} chars received)",
                self.content.len()
            ))
        })?;

        Ok(CompleteResponse {
            content: self.content,
            finish_reason,
            usage: self.usage.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_accumulation() {
        let mut accumulator = ResponseAccumulator::new();

        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "import ".to_string(),
            })
            .unwrap();
        assert_eq!(accumulator.current_content(), "import ");

        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "dash".to_string(),
            })
            .unwrap();
        assert_eq!(accumulator.current_content(), "import dash");
    }

    #[test]
    fn test_finalization() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "print(1)".to_string(),
            })
            .unwrap();
        accumulator
            .process_event(StreamEvent::Usage {
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 3,
                },
            })
            .unwrap();
        accumulator
            .process_event(StreamEvent::Done {
                finish_reason: FinishReason::Length,
            })
            .unwrap();

        let complete = accumulator.finalize().unwrap();
        assert_eq!(complete.content, "print(1)");
        assert_eq!(complete.finish_reason, FinishReason::Length);
        assert_eq!(complete.usage.output_tokens, 3);
    }

    #[test]
    fn test_usage_defaults_when_not_reported() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator
            .process_event(StreamEvent::Done {
                finish_reason: FinishReason::Stop,
            })
            .unwrap();

        let complete = accumulator.finalize().unwrap();
        assert!(complete.content.is_empty());
        assert_eq!(complete.usage, Usage::default());
    }

    #[test]
    fn test_missing_finish_reason_is_an_error() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "import dash\napp.layout = html.Div([".to_string(),
            })
            .unwrap();

        let err = accumulator.finalize().unwrap_err();
        assert!(matches!(err, Error::Streaming(msg) if msg.contains("ended before the model finished")));
    }

    #[test]
    fn test_error_event_is_returned() {
        let mut accumulator = ResponseAccumulator::new();
        let result = accumulator.process_event(StreamEvent::Error {
            error: "quota".to_string(),
        });
        assert!(matches!(result, Err(Error::Streaming(msg)) if msg == "quota"));
    }
}
