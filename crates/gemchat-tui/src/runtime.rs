//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! Reply streams run on spawned tasks and push their events into the ingest
//! channel, which the loop drains once per iteration. Only the loop touches
//! `AppState`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event;
use gemchat_core::ingest::{IngestEvent, drive_reply};
use gemchat_core::providers::ChatRequest;
use gemchat_core::providers::gemini::GeminiClient;
use tokio::sync::mpsc;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::TerminalSession;
use crate::{render, update};

/// Frame cadence while a reply is streaming.
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll timeout when nothing is streaming.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

pub struct TuiRuntime {
    session: TerminalSession,
    pub state: AppState,
    ingest_tx: mpsc::UnboundedSender<IngestEvent>,
    ingest_rx: mpsc::UnboundedReceiver<IngestEvent>,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot enter TUI mode.
    pub fn new(state: AppState) -> Result<Self> {
        let session = TerminalSession::enter()?;
        let (ingest_tx, ingest_rx) = mpsc::unbounded_channel();
        Ok(Self {
            session,
            state,
            ingest_tx,
            ingest_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs until the user quits. The terminal is restored on return.
    ///
    /// # Errors
    /// Returns an error if reading terminal input or drawing fails.
    pub fn run(mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            let size = self.session.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                // Input and stream events are batched until the next tick.
                if matches!(event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                for effect in effects {
                    self.execute_effect(effect);
                }
            }

            if dirty {
                let mut max_offset = 0;
                self.session.terminal.draw(|frame| {
                    max_offset = render::render(&self.state, frame);
                })?;
                self.state.scroll.max_offset = max_offset;
                let scroll = &mut self.state.scroll;
                scroll.offset_from_bottom = scroll.offset_from_bottom.min(max_offset);
                dirty = false;
            }
        }

        Ok(())
    }

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.state.session.is_busy() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.ingest_rx.try_recv() {
            events.push(UiEvent::Ingest(ev));
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
            // Input should show up on screen without waiting out an idle tick.
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        } else if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::StartReply { request } => {
                let Some(model) = self.state.model.clone() else {
                    tracing::warn!("reply requested without a model");
                    return;
                };
                self.spawn_reply(model, request);
            }
        }
    }

    fn spawn_reply(&self, model: Arc<GeminiClient>, request: ChatRequest) {
        let tx = self.ingest_tx.clone();
        tokio::spawn(async move {
            drive_reply(&*model, request, |event| {
                let _ = tx.send(event);
            })
            .await;
        });
    }
}
