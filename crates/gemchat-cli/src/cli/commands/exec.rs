//! Exec command handler.

use std::io::{Write, stdout};

use anyhow::{Context, Result};
use gemchat_core::config::Config;
use gemchat_core::ingest::{self, SubmitOutcome};
use gemchat_core::providers::gemini::{GeminiClient, GeminiConfig};
use gemchat_core::session::{ChatSession, STREAM_FAILURE_NOTICE};

/// Sends `prompt` once and streams the reply to stdout.
///
/// # Errors
/// Returns an error for a blank prompt, a client that cannot be built, or
/// a failed stream.
pub async fn run(prompt: &str, config: &Config) -> Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt must not be empty");
    }

    let client = GeminiConfig::from_config(config)
        .map(GeminiClient::new)
        .context("initialize Gemini client")?;
    let mut session = ChatSession::new(config.effective_system_prompt()?);

    let mut out = stdout();
    let mut printed = 0usize;
    let mut write_error = None;

    let outcome = ingest::submit(&mut session, &client, prompt, |session| {
        let Some(text) = session.streaming_text() else {
            return;
        };
        if text.len() > printed && write_error.is_none() {
            let chunk = &text[printed..];
            printed = text.len();
            if let Err(e) = out.write_all(chunk.as_bytes()).and_then(|()| out.flush()) {
                write_error = Some(e);
            }
        }
    })
    .await;

    if let Some(e) = write_error {
        return Err(e).context("write reply to stdout");
    }

    match outcome {
        SubmitOutcome::Succeeded => {
            writeln!(out)?;
            Ok(())
        }
        SubmitOutcome::Failed => {
            if printed > 0 {
                writeln!(out)?;
            }
            anyhow::bail!(STREAM_FAILURE_NOTICE)
        }
        SubmitOutcome::Ignored => anyhow::bail!("Prompt was not submitted"),
    }
}
