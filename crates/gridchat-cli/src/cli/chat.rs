//! Interactive chat loop and one-shot prompt commands.
//!
//! Streams the reply live: reasoning fragments render dimmed as they
//! arrive, answer fragments render normally. Persistence happens inside
//! the service once the stream completes, so Ctrl+C mid-reply loses the
//! partial response but never corrupts the log.

use std::io::Write as _;

use anyhow::Result;
use console::style;
use futures_util::StreamExt;
use uuid::Uuid;

use gridchat_types::chat::FragmentChannel;

use crate::state::AppState;

/// Run the interactive loop. Reads a line, streams the reply, repeats
/// until EOF (Ctrl+D) or `/exit`.
pub async fn run_chat(
    state: &AppState,
    chat_id: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let chat_id = chat_id.unwrap_or_else(new_chat_id);
    let model = model.as_deref().unwrap_or(&state.model).to_string();

    println!();
    println!("  {} {}", style("Model:").bold(), style(&model).dim());
    println!(
        "  {} {}",
        style("Session:").bold(),
        style(short_id(&chat_id)).dim()
    );
    println!();
    println!("  {}", style("Type /exit or press Ctrl+D to quit").dim());
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("  {} ", style("You >").green().bold());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            println!("\n  {}", style("Session ended.").dim());
            break;
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "/exit" || prompt == "/quit" {
            println!("  {}", style("Session ended.").dim());
            break;
        }

        println!();
        stream_reply(state, &chat_id, prompt, &model, true).await?;
        println!();
    }

    Ok(())
}

/// One-shot prompt: stream the reply and exit.
pub async fn ask(
    state: &AppState,
    prompt: &str,
    chat_id: Option<String>,
    model: Option<String>,
    show_thinking: bool,
) -> Result<()> {
    let chat_id = chat_id.unwrap_or_else(new_chat_id);
    let model = model.as_deref().unwrap_or(&state.model);

    stream_reply(state, &chat_id, prompt, model, show_thinking).await?;
    eprintln!();
    eprintln!(
        "  {} {}",
        style("session:").dim(),
        style(&chat_id).dim()
    );
    Ok(())
}

async fn stream_reply(
    state: &AppState,
    chat_id: &str,
    prompt: &str,
    model: &str,
    show_thinking: bool,
) -> Result<()> {
    let mut stream = state
        .service
        .stream_turn(chat_id, prompt, model, &state.generation);

    let mut in_think = false;
    while let Some(fragment) = stream.next().await {
        let fragment = match fragment {
            Ok(f) => f,
            Err(err) => {
                println!();
                eprintln!("  {} {err}", style("!").red().bold());
                return Ok(());
            }
        };

        match fragment.channel {
            FragmentChannel::Think => {
                if show_thinking {
                    if !in_think {
                        in_think = true;
                    }
                    print!("{}", style(&fragment.text).dim());
                }
            }
            FragmentChannel::Answer => {
                if in_think {
                    // Separate the dimmed reasoning from the answer.
                    println!();
                    in_think = false;
                }
                print!("{}", fragment.text);
            }
        }
        std::io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn new_chat_id() -> String {
    Uuid::now_v7().to_string()
}

/// First eight characters of a session id for display. Generated ids are
/// ASCII UUIDs, but user-supplied ids can hold multibyte text, so slice
/// on character boundaries.
fn short_id(chat_id: &str) -> &str {
    match chat_id.char_indices().nth(8) {
        Some((idx, _)) => &chat_id[..idx],
        None => chat_id,
    }
}
