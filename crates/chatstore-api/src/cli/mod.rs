//! CLI command definitions for the `chatstore` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chats;
pub mod maintenance;
pub mod messages;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Inspect and maintain stored chat history.
#[derive(Parser)]
#[command(name = "chatstore", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed logs (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Database URI (overrides CHATSTORE_DB_URI and config.toml).
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending schema migrations and report the result.
    Migrate,

    /// Show chat and message counts.
    Stats,

    /// List chats, most recently active first.
    #[command(alias = "ls")]
    Chats(ChatArgs),

    /// Delete a chat and all of its messages.
    #[command(name = "delete-chat", alias = "rm")]
    DeleteChat {
        /// Chat JID, e.g. 15550001@s.whatsapp.net.
        jid: String,

        /// Skip the confirmation requirement.
        #[arg(long)]
        yes: bool,
    },

    /// List messages, newest first.
    Messages(MessageArgs),

    /// Case-insensitive text search within one chat.
    Search {
        /// Chat JID to search in.
        chat: String,

        /// Text to look for.
        text: String,

        /// Maximum results (0 = no limit).
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show one message by ID.
    Show {
        /// Message ID.
        id: String,
    },

    /// Remove every chat and message.
    Truncate {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct ChatArgs {
    /// Case-insensitive substring of the chat name.
    #[arg(long)]
    pub search: Option<String>,

    /// Only chats with at least one media message.
    #[arg(long)]
    pub has_media: bool,

    /// Maximum chats to display (0 = no limit).
    #[arg(long, default_value = "50")]
    pub limit: u32,

    /// Chats to skip.
    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Args)]
pub struct MessageArgs {
    /// Restrict to one chat JID.
    #[arg(long)]
    pub chat: Option<String>,

    /// Only messages at or after this RFC 3339 time.
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Only messages at or before this RFC 3339 time.
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,

    /// Only messages carrying media.
    #[arg(long)]
    pub media_only: bool,

    /// Only messages sent by this account.
    #[arg(long, conflicts_with = "from_others")]
    pub from_me: bool,

    /// Only messages received from others.
    #[arg(long)]
    pub from_others: bool,

    /// Maximum messages to display (0 = no limit).
    #[arg(long, default_value = "50")]
    pub limit: u32,
}

/// Shorten `text` to at most `max` characters, marking the cut.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
