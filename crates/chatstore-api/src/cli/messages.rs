//! Message listing, search, and lookup commands.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::chat::{Message, MessageFilter};

use super::{MessageArgs, preview};
use crate::state::AppState;

pub async fn list_messages(state: &AppState, args: MessageArgs, json: bool) -> Result<()> {
    let is_from_me = match (args.from_me, args.from_others) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let filter = MessageFilter {
        chat_jid: args.chat,
        start_time: args.since,
        end_time: args.until,
        media_only: args.media_only,
        is_from_me,
        limit: Some(args.limit),
    };
    let messages = state.storage.get_messages(&filter).await?;
    render_messages(&messages, json)
}

pub async fn search(state: &AppState, chat: &str, text: &str, limit: u32, json: bool) -> Result<()> {
    if text.is_empty() {
        bail!("Search text must not be empty");
    }
    let messages = state.storage.search_messages(chat, text, limit).await?;
    render_messages(&messages, json)
}

pub async fn show_message(state: &AppState, id: &str, json: bool) -> Result<()> {
    let Some(message) = state.storage.get_message_by_id(id).await? else {
        bail!("Message '{id}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Message").bold(), style(&message.id).cyan());
    println!("  Chat:      {}", message.chat_jid);
    println!("  Sender:    {}", message.sender);
    println!("  Time:      {}", message.timestamp.to_rfc3339());
    println!("  From me:   {}", message.is_from_me);
    if message.has_media() {
        println!("  Media:     {}", style(&message.media_type).yellow());
        if !message.filename.is_empty() {
            println!("  File:      {}", message.filename);
        }
        if message.file_length > 0 {
            println!("  Size:      {} bytes", message.file_length);
        }
        if !message.url.is_empty() {
            println!("  URL:       {}", style(&message.url).dim());
        }
    }
    if !message.content.is_empty() {
        println!();
        for line in message.content.lines() {
            println!("    {line}");
        }
    }
    println!();
    Ok(())
}

fn render_messages(messages: &[Message], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  {} No messages found.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Chat").fg(Color::White),
        Cell::new("Sender").fg(Color::White),
        Cell::new("Content").fg(Color::White),
        Cell::new("Media").fg(Color::White),
    ]);

    for message in messages {
        let sender = if message.is_from_me {
            Cell::new("me").fg(Color::Green)
        } else {
            Cell::new(&message.sender)
        };
        table.add_row(vec![
            Cell::new(message.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&message.chat_jid).fg(Color::Cyan),
            sender,
            Cell::new(preview(&message.content, 60)),
            Cell::new(&message.media_type).fg(Color::Yellow),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}
