//! UI event types.
//!
//! Every external input (terminal, reply stream, timers) is converted to a
//! `UiEvent` before it reaches the reducer.

use crossterm::event::Event as CrosstermEvent;
use gemchat_core::ingest::IngestEvent;

#[derive(Debug)]
pub enum UiEvent {
    /// Animation/render cadence.
    Tick,
    /// Current terminal size, sent first in every batch.
    Frame { width: u16, height: u16 },
    /// Raw terminal input.
    Terminal(CrosstermEvent),
    /// Next event from the in-flight reply stream.
    Ingest(IngestEvent),
}
