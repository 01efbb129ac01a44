//! Gemini SSE stream parser.
//!
//! Turns the raw `alt=sse` byte stream into text fragments. Each `data:`
//! payload is a full `GenerateContentResponse` chunk; its non-thought text
//! parts are concatenated into one fragment.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde_json::Value;

use crate::providers::{ProviderError, ProviderErrorKind, ProviderResult};

/// Gemini SSE stream parser.
///
/// Yields one item per non-empty text chunk, or an error for malformed
/// payloads, API error objects, blocked prompts and transport failures.
pub struct GeminiSseParser<S> {
    inner: EventStream<S>,
    pending: VecDeque<ProviderResult<String>>,
    finish_reason: Option<String>,
    fragments: usize,
}

impl<S> GeminiSseParser<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
            pending: VecDeque::new(),
            finish_reason: None,
            fragments: 0,
        }
    }

    fn handle_event_data(&mut self, data: &str) -> ProviderResult<()> {
        let trimmed = data.trim();
        if trimmed.is_empty() || trimmed == "[DONE]" {
            return Ok(());
        }

        let value = serde_json::from_str::<Value>(trimmed).map_err(|err| {
            ProviderError::new(
                ProviderErrorKind::Parse,
                format!("Failed to parse SSE JSON: {err}"),
            )
        })?;
        self.handle_chunk(&value);
        Ok(())
    }

    fn handle_chunk(&mut self, value: &Value) {
        let payload = value.get("response").unwrap_or(value);

        if let Some(error) = value.get("error").or_else(|| payload.get("error")) {
            let error_type = error
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| error.get("code").map(ToString::to_string))
                .unwrap_or_else(|| "error".to_string());
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            self.pending
                .push_back(Err(ProviderError::api_error(&error_type, message)));
            return;
        }

        let candidate = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first());

        let Some(candidate) = candidate else {
            if let Some(reason) = payload
                .get("promptFeedback")
                .and_then(|feedback| feedback.get("blockReason"))
                .and_then(Value::as_str)
            {
                self.pending.push_back(Err(ProviderError::api_error(
                    "blocked",
                    &format!("prompt blocked ({reason})"),
                )));
            }
            return;
        };

        if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
            self.finish_reason = Some(reason.to_string());
        }

        let text: String = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();

        if !text.is_empty() {
            self.fragments += 1;
            self.pending.push_back(Ok(text));
        }
    }
}

impl<S, E> Stream for GeminiSseParser<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ProviderResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Poll::Ready(Some(item));
            }

            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Err(err) = self.handle_event_data(&event.data) {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(ProviderError::new(
                        ProviderErrorKind::Parse,
                        format!("SSE stream error: {e}"),
                    ))));
                }
                Poll::Ready(None) => {
                    tracing::debug!(
                        fragments = self.fragments,
                        finish_reason = self.finish_reason.as_deref().unwrap_or("none"),
                        "stream ended"
                    );
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use serde_json::json;

    use super::*;

    fn parser_over(
        body: &'static str,
    ) -> GeminiSseParser<impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin> {
        GeminiSseParser::new(stream::iter(vec![Ok(Bytes::from_static(
            body.as_bytes(),
        ))]))
    }

    fn empty_parser() -> GeminiSseParser<impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin>
    {
        GeminiSseParser::new(stream::empty())
    }

    #[test]
    fn test_text_parts_are_concatenated_into_one_fragment() {
        let mut parser = empty_parser();
        parser.handle_chunk(&json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }] }
            }]
        }));

        assert_eq!(parser.pending.len(), 1);
        assert_eq!(parser.pending.pop_front().unwrap().unwrap(), "Hello");
    }

    #[test]
    fn test_thought_parts_are_skipped() {
        let mut parser = empty_parser();
        parser.handle_chunk(&json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "thought": true, "text": "thinking..." },
                        { "text": "Answer" }
                    ]
                }
            }]
        }));

        assert_eq!(parser.pending.pop_front().unwrap().unwrap(), "Answer");
        assert!(parser.pending.is_empty());
    }

    #[test]
    fn test_empty_text_emits_nothing() {
        let mut parser = empty_parser();
        parser.handle_chunk(&json!({
            "candidates": [{
                "content": { "parts": [{ "text": "" }] },
                "finishReason": "STOP"
            }]
        }));

        assert!(parser.pending.is_empty());
        assert_eq!(parser.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_error_object_becomes_api_error() {
        let mut parser = empty_parser();
        parser.handle_chunk(&json!({
            "error": { "code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED" }
        }));

        let err = parser.pending.pop_front().unwrap().unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ApiError);
        assert_eq!(err.message, "RESOURCE_EXHAUSTED: Resource exhausted");
    }

    #[test]
    fn test_blocked_prompt_becomes_api_error() {
        let mut parser = empty_parser();
        parser.handle_chunk(&json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }));

        let err = parser.pending.pop_front().unwrap().unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ApiError);
        assert!(err.message.contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}],\"role\":\"model\"}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo, \"}],\"role\":\"model\"}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"world\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}]}\n\n",
        );

        let fragments: Vec<String> = parser_over(body)
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(fragments, vec!["Hel", "lo, ", "world"]);
    }

    #[tokio::test]
    async fn test_malformed_json_yields_parse_error() {
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}\n\n",
            "data: {not json\n\n",
        );

        let items: Vec<ProviderResult<String>> = parser_over(body).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
        assert_eq!(
            items[1].as_ref().unwrap_err().kind,
            ProviderErrorKind::Parse
        );
    }

    #[tokio::test]
    async fn test_done_marker_is_ignored() {
        let items: Vec<ProviderResult<String>> = parser_over("data: [DONE]\n\n").collect().await;
        assert!(items.is_empty());
    }
}
