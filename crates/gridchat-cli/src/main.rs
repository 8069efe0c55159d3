//! GridChat CLI entry point.
//!
//! Binary name: `gridchat`
//!
//! Parses CLI arguments, initializes the store and backend, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match args.verbose {
        0 if args.quiet => "error",
        0 => "warn",
        1 => "info,gridchat=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let state = AppState::init().await?;

    match args.command {
        Commands::Chat { chat_id, model } => {
            cli::chat::run_chat(&state, chat_id, model).await?;
        }

        Commands::Ask {
            prompt,
            chat_id,
            model,
            show_thinking,
        } => {
            cli::chat::ask(&state, &prompt, chat_id, model, show_thinking).await?;
        }

        Commands::Sessions => {
            cli::session::list_sessions(&state, args.json).await?;
        }

        Commands::History {
            chat_id,
            show_thinking,
        } => {
            cli::session::show_history(&state, &chat_id, show_thinking, args.json).await?;
        }
    }

    Ok(())
}
