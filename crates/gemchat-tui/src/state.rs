//! Application state owned by the runtime and mutated by the reducer.

use std::sync::Arc;

use gemchat_core::providers::gemini::GeminiClient;
use gemchat_core::session::ChatSession;

use crate::input::InputState;

/// Transcript scroll position, measured in rendered lines from the bottom.
///
/// An offset of zero means the view follows new content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrollState {
    pub offset_from_bottom: usize,
    /// Largest useful offset for the last rendered frame.
    pub max_offset: usize,
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        self.offset_from_bottom == 0
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset_from_bottom = (self.offset_from_bottom + lines).min(self.max_offset);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.offset_from_bottom = self.max_offset;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }
}

pub struct AppState {
    pub session: ChatSession,
    /// `None` when the client could not be built; submissions are then refused.
    pub model: Option<Arc<GeminiClient>>,
    pub model_name: String,
    pub input: InputState,
    pub scroll: ScrollState,
    /// Conversation revision the view last reacted to.
    pub seen_revision: u64,
    pub spinner_frame: usize,
    pub viewport_height: u16,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: ChatSession, model: Option<GeminiClient>, model_name: String) -> Self {
        let mut session = session;
        if model.is_none() {
            session.report_init_failure();
        }
        let seen_revision = session.conversation().revision();
        Self {
            session,
            model: model.map(Arc::new),
            model_name,
            input: InputState::default(),
            scroll: ScrollState::default(),
            seen_revision,
            spinner_frame: 0,
            viewport_height: 0,
            should_quit: false,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.model.is_some() && !self.session.is_busy()
    }
}
