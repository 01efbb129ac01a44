//! Streaming ingest loop.
//!
//! Drives one outstanding request against a [`ChatModel`] and folds the
//! resulting fragments into a [`ChatSession`]. Every stream ends with exactly
//! one terminal event: `Completed` or `Failed`.

use futures_util::StreamExt;

use crate::providers::{ChatModel, ChatRequest, ProviderError};
use crate::session::ChatSession;

/// One step of a streaming reply.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// Next piece of reply text, in arrival order.
    Fragment(String),
    /// The stream ended normally.
    Completed,
    /// Opening or reading the stream failed; no more events follow.
    Failed(ProviderError),
}

impl IngestEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IngestEvent::Fragment(_))
    }
}

/// How a call to [`submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or another submission was in flight.
    Ignored,
    Succeeded,
    Failed,
}

/// Streams a reply for `request`, handing each event to `emit`.
///
/// Empty fragments are dropped. A stream that ends without an error counts
/// as completed, whether or not the server reported a finish reason.
pub async fn drive_reply<M, F>(model: &M, request: ChatRequest, mut emit: F)
where
    M: ChatModel,
    F: FnMut(IngestEvent),
{
    let mut stream = match model.stream_reply(request).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(%err, kind = %err.kind, "failed to open reply stream");
            emit(IngestEvent::Failed(err));
            return;
        }
    };

    let mut fragments = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(text) if text.is_empty() => {}
            Ok(text) => {
                fragments += 1;
                emit(IngestEvent::Fragment(text));
            }
            Err(err) => {
                tracing::warn!(%err, kind = %err.kind, fragments, "reply stream failed");
                emit(IngestEvent::Failed(err));
                return;
            }
        }
    }

    tracing::debug!(fragments, "reply stream completed");
    emit(IngestEvent::Completed);
}

/// Runs one full submission in place.
///
/// Opens the submission on `session`, streams the reply and applies every
/// event as it arrives. `observe` is called after each applied event, so it
/// sees every intermediate state of the conversation.
pub async fn submit<M, F>(
    session: &mut ChatSession,
    model: &M,
    input: &str,
    mut observe: F,
) -> SubmitOutcome
where
    M: ChatModel,
    F: FnMut(&ChatSession),
{
    let Some(request) = session.begin_submission(input) else {
        tracing::debug!("submission ignored");
        return SubmitOutcome::Ignored;
    };
    tracing::info!(history = request.history.len(), "submission started");
    observe(session);

    let mut outcome = SubmitOutcome::Succeeded;
    drive_reply(model, request, |event| {
        if matches!(event, IngestEvent::Failed(_)) {
            outcome = SubmitOutcome::Failed;
        }
        session.apply(event);
        observe(session);
    })
    .await;

    tracing::info!(?outcome, "submission finished");
    outcome
}
