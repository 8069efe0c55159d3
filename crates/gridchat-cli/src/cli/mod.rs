//! CLI command definitions and dispatch for the `gridchat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};

/// Chat with a local or remote language model, with durable history.
#[derive(Parser)]
#[command(name = "gridchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Resume an existing session instead of starting a new one.
        #[arg(long)]
        chat_id: Option<String>,

        /// Override the configured model for this session.
        #[arg(long)]
        model: Option<String>,
    },

    /// Send a single prompt and print the streamed reply.
    Ask {
        /// The prompt to send.
        prompt: String,

        /// Append to an existing session instead of starting a new one.
        #[arg(long)]
        chat_id: Option<String>,

        /// Override the configured model for this request.
        #[arg(long)]
        model: Option<String>,

        /// Print the reasoning channel too (dimmed).
        #[arg(long)]
        show_thinking: bool,
    },

    /// List past sessions.
    #[command(alias = "ls")]
    Sessions,

    /// Print the full message log of a session.
    History {
        /// Session id, as shown by `gridchat sessions`.
        chat_id: String,

        /// Include reasoning messages (hidden by default).
        #[arg(long)]
        show_thinking: bool,
    },
}
