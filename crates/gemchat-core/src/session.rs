//! Chat session: the conversation plus the single-flight submission state.
//!
//! A submission moves `Idle -> Streaming -> Idle`. While streaming, the
//! session owns the accumulated reply text and the id of the placeholder
//! model message it rewrites on every fragment. New submissions are refused
//! (not queued) until the stream reaches a terminal state.

use crate::conversation::{Conversation, MessageId, Role};
use crate::ingest::IngestEvent;
use crate::providers::ChatRequest;

/// Suffix shown on the placeholder while more text may still arrive.
pub const PENDING_MARKER: &str = "...";

/// Shown in place of a reply whose stream failed.
pub const STREAM_FAILURE_NOTICE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// Shown once when the model client could not be built.
pub const INIT_FAILURE_NOTICE: &str =
    "Failed to initialize the AI model. Please check the API key and configuration.";

/// Submission lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Streaming {
        placeholder: MessageId,
        accumulated: String,
    },
}

/// Conversation plus busy flag, mutated only through the methods below.
#[derive(Debug, Default)]
pub struct ChatSession {
    conversation: Conversation,
    state: SubmissionState,
    system_instruction: Option<String>,
}

impl ChatSession {
    pub fn new(system_instruction: Option<String>) -> Self {
        Self {
            system_instruction,
            ..Self::default()
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// True exactly while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SubmissionState::Streaming { .. })
    }

    /// Reply text received so far for the in-flight submission.
    pub fn streaming_text(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Streaming { accumulated, .. } => Some(accumulated),
            SubmissionState::Idle => None,
        }
    }

    /// Opens a submission for `input`.
    ///
    /// Returns `None` without touching anything when the trimmed input is
    /// empty or another submission is still streaming. Otherwise appends the
    /// user message and the placeholder, marks the session busy, and returns
    /// the request to send. History only covers exchanges completed before
    /// this call.
    pub fn begin_submission(&mut self, input: &str) -> Option<ChatRequest> {
        let text = input.trim();
        if text.is_empty() || self.is_busy() {
            return None;
        }

        let history = self.conversation.exchanges();
        self.conversation.append(Role::User, text);
        let placeholder = self.conversation.append(Role::Model, PENDING_MARKER);
        self.state = SubmissionState::Streaming {
            placeholder,
            accumulated: String::new(),
        };

        Some(ChatRequest {
            system_instruction: self.system_instruction.clone(),
            history,
            message: text.to_string(),
        })
    }

    /// Applies one stream event.
    pub fn apply(&mut self, event: IngestEvent) {
        match event {
            IngestEvent::Fragment(text) => self.push_fragment(&text),
            IngestEvent::Completed => self.finish(),
            IngestEvent::Failed(_) => self.fail(),
        }
    }

    /// Appends `text` to the reply and rewrites the placeholder with it.
    ///
    /// The accumulate and the replace happen together, so observers never
    /// see one without the other. Ignored when idle.
    pub fn push_fragment(&mut self, text: &str) {
        let SubmissionState::Streaming {
            placeholder,
            accumulated,
        } = &mut self.state
        else {
            return;
        };
        accumulated.push_str(text);
        self.conversation
            .replace(*placeholder, format!("{accumulated}{PENDING_MARKER}"));
    }

    /// Writes the final reply text and clears the busy flag.
    pub fn finish(&mut self) {
        let SubmissionState::Streaming {
            placeholder,
            accumulated,
        } = std::mem::take(&mut self.state)
        else {
            return;
        };
        self.conversation.replace(placeholder, accumulated);
    }

    /// Drops the placeholder (and any partial text), appends the failure
    /// notice and clears the busy flag.
    pub fn fail(&mut self) {
        let SubmissionState::Streaming { placeholder, .. } = std::mem::take(&mut self.state)
        else {
            return;
        };
        self.conversation.remove(placeholder);
        self.conversation.append(Role::Error, STREAM_FAILURE_NOTICE);
    }

    /// Records that the model client could not be created.
    pub fn report_init_failure(&mut self) {
        self.conversation.append(Role::Error, INIT_FAILURE_NOTICE);
    }
}
