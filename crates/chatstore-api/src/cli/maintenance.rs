//! Schema, statistics, and truncation commands.

use anyhow::{Result, bail};
use console::style;

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::config::BackendKind;

use crate::state::AppState;

/// Report the migrations applied while opening the store.
pub fn migrate(state: &AppState, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({ "applied": state.migrations_applied });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if state.migrations_applied == 0 {
        println!("  {} Schema is up to date", style("✓").green().bold());
    } else {
        println!(
            "  {} Applied {} migration(s)",
            style("✓").green().bold(),
            state.migrations_applied
        );
    }
    Ok(())
}

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.storage.get_storage_statistics().await?;
    let backend = match state.storage.backend() {
        BackendKind::Sqlite => "sqlite",
        BackendKind::Postgres => "postgres",
    };

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": backend,
            "data_dir": state.data_dir.display().to_string(),
            "max_connections": state.config.max_connections,
            "chats": stats.chat_count,
            "messages": stats.message_count,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} chatstore v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {}", style("── Storage ──").dim());
    println!("  Backend:  {}", style(backend).cyan());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Chats:    {}", style(stats.chat_count).bold());
    println!("  Messages: {}", style(stats.message_count).bold());
    println!();
    Ok(())
}

/// Delete every chat and message. Requires `--yes`.
pub async fn truncate(state: &AppState, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to truncate chat storage without --yes");
    }

    let before = state.storage.get_storage_statistics().await?;
    state.storage.truncate_all_data_with_logging("[cli]").await?;

    if json {
        let out = serde_json::json!({
            "removed_chats": before.chat_count,
            "removed_messages": before.message_count,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "  {} Removed {} chats and {} messages",
        style("✓").green().bold(),
        before.chat_count,
        before.message_count
    );
    Ok(())
}
