//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use gemchat_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(version)]
#[command(about = "Chat with Gemini from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the model from config
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Override the system prompt from config (empty disables it)
    #[arg(long, global = true)]
    system_prompt: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Send one prompt and stream the reply to stdout
    Exec {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        model,
        system_prompt,
    } = cli;

    match command {
        None => {
            let config = load_config(model, system_prompt.as_deref())?;
            commands::chat::run(&config).await
        }
        Some(Commands::Exec { prompt }) => {
            let config = load_config(model, system_prompt.as_deref())?;
            commands::exec::run(&prompt, &config).await
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

/// Loads the config file and applies command-line overrides.
fn load_config(model: Option<String>, system_prompt: Option<&str>) -> Result<config::Config> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(model) = model {
        config.model = model;
    }
    if let Some(sp) = system_prompt {
        let trimmed = sp.trim();
        config.system_prompt = (!trimmed.is_empty()).then(|| trimmed.to_string());
        config.system_prompt_file = None;
    }
    Ok(config)
}
