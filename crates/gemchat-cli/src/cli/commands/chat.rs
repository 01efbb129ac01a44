//! Chat command handler.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use gemchat_core::config::Config;
use gemchat_core::providers::gemini::{GeminiClient, GeminiConfig};

use super::exec;

pub async fn run(config: &Config) -> Result<()> {
    // Piped stdin runs a single exec instead of the chat screen.
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return exec::run(prompt, config).await;
    }

    let model = GeminiConfig::from_config(config).map(GeminiClient::new);
    gemchat_tui::run_interactive_chat(config, model)
        .await
        .context("interactive chat failed")
}
