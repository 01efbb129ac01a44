//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer only mutates state; spawning and I/O happen in the runtime.

use gemchat_core::providers::ChatRequest;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,
    /// Stream a reply for a submission the session has already opened.
    StartReply { request: ChatRequest },
}
