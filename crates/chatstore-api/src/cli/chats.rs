//! Chat listing and deletion commands.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::chat::ChatFilter;

use super::{ChatArgs, preview};
use crate::state::AppState;

/// List chats with their last activity and message counts.
pub async fn list_chats(state: &AppState, args: ChatArgs, json: bool) -> Result<()> {
    let filter = ChatFilter {
        search_name: args.search,
        has_media: args.has_media,
        limit: Some(args.limit),
        offset: args.offset,
    };
    let chats = state.storage.get_chats(&filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!("  {} No chats found.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("JID").fg(Color::White),
        Cell::new("Last message").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Disappearing").fg(Color::White),
    ]);

    for chat in &chats {
        let count = state.storage.get_chat_message_count(&chat.jid).await?;
        let expiration = if chat.ephemeral_expiration > 0 {
            Cell::new(format_expiration(chat.ephemeral_expiration)).fg(Color::Yellow)
        } else {
            Cell::new("off").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(preview(&chat.name, 32)).fg(Color::Cyan),
            Cell::new(&chat.jid),
            Cell::new(chat.last_message_time.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(count),
            expiration,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Delete a chat (and its messages). Requires `--yes`.
pub async fn delete_chat(state: &AppState, jid: &str, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete '{jid}' without --yes");
    }

    let deleted = state.storage.delete_chat(jid).await?;

    if json {
        let out = serde_json::json!({ "jid": jid, "deleted": deleted });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if deleted {
        println!("  {} Deleted chat {}", style("✓").green().bold(), style(jid).cyan());
    } else {
        println!("  {} No chat {}", style("i").blue().bold(), style(jid).cyan());
    }
    Ok(())
}

/// Human form of a disappearing-message timer.
fn format_expiration(seconds: u32) -> String {
    const DAY: u32 = 86_400;
    match seconds {
        s if s % DAY == 0 => format!("{}d", s / DAY),
        s if s % 3_600 == 0 => format!("{}h", s / 3_600),
        s => format!("{s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_expiration() {
        assert_eq!(format_expiration(86_400), "1d");
        assert_eq!(format_expiration(604_800), "7d");
        assert_eq!(format_expiration(7_200), "2h");
        assert_eq!(format_expiration(90), "90s");
    }
}
