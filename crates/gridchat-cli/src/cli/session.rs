//! Session browsing commands: list sessions, print a message log.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use gridchat_core::chat::ChatStore;
use gridchat_types::chat::ChatRole;

use crate::state::AppState;

/// List past sessions with id, creation time, and title.
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.service.store().list_sessions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("gridchat chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Title").fg(Color::White),
    ]);

    for session in &sessions {
        let title = session.title.as_deref().unwrap_or("(untitled)");
        let title_display = truncate_title(title, 48);

        table.add_row(vec![
            Cell::new(&session.chat_id).fg(Color::DarkGrey),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string())
                .fg(Color::White),
            Cell::new(title_display).fg(Color::Cyan),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Cap a title at `max` characters, appending an ellipsis when cut.
/// Counts characters rather than bytes so multibyte titles never split
/// inside a code point.
fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Print a session's full message log.
pub async fn show_history(
    state: &AppState,
    chat_id: &str,
    show_thinking: bool,
    json: bool,
) -> Result<()> {
    let history = state.service.store().fetch_history(chat_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!();
        println!(
            "  {} No messages for session '{}'.",
            style("i").blue().bold(),
            style(chat_id).cyan()
        );
        println!();
        return Ok(());
    }

    if let Some(title) = state.service.store().get_title(chat_id).await? {
        println!();
        println!("  {}", style(title).cyan().bold());
    }
    println!();

    for record in &history {
        match record.role {
            ChatRole::User => {
                println!("  {} {}", style("You >").green().bold(), record.content);
            }
            ChatRole::Assistant => {
                println!("  {} {}", style("AI  >").cyan().bold(), record.content);
            }
            ChatRole::AssistantThink => {
                if show_thinking {
                    println!(
                        "  {} {}",
                        style("think").dim().bold(),
                        style(&record.content).dim()
                    );
                }
            }
        }
        println!();
    }

    Ok(())
}
