//! Full-screen chat UI.

pub mod effects;
pub mod events;
pub mod input;
pub mod markdown;
pub mod render;
pub mod runtime;
pub mod state;
pub mod style;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use gemchat_core::config::Config;
use gemchat_core::providers::gemini::GeminiClient;
use gemchat_core::session::ChatSession;
pub use runtime::TuiRuntime;
use state::AppState;

/// Runs the interactive chat screen until the user quits.
///
/// `model` is the result of building the client; on error the screen still
/// opens, showing the initialization notice with input disabled.
pub async fn run_interactive_chat(config: &Config, model: Result<GeminiClient>) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `gemchat exec --prompt '...'` for non-interactive use."
        );
    }

    let system_prompt = config.effective_system_prompt()?;
    let model = match model {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "model unavailable");
            None
        }
    };
    tracing::info!(model = %config.model, ready = model.is_some(), "starting chat");

    let state = AppState::new(ChatSession::new(system_prompt), model, config.model.clone());
    TuiRuntime::new(state)?.run()?;

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
