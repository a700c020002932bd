//! Chat and message records plus the filters used to query them.
//!
//! A `Chat` is one conversation (direct, group, or newsletter) keyed by its
//! JID. A `Message` belongs to exactly one chat and is keyed by
//! `(id, chat_jid)`, since message IDs are only unique within their chat.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// 0000-01-01T00:00:00Z as a Unix timestamp.
const MIN_TIMESTAMP_SECS: i64 = -62_167_219_200;

/// 9999-12-31T23:59:59Z as a Unix timestamp.
const MAX_TIMESTAMP_SECS: i64 = 253_402_300_799;

/// Truncate a timestamp to microsecond precision and clamp it to the years
/// 0000 through 9999.
///
/// Both storage backends persist microseconds; every timestamp is
/// normalized through this before it is written so reads return exactly
/// what was stored. SQLite keeps timestamps as RFC 3339 text, which is only
/// fixed-width (and so sorts in time order) inside that year range.
pub fn normalize_timestamp(dt: DateTime<Utc>) -> DateTime<Utc> {
    let dt = dt.trunc_subsecs(6);
    if dt.timestamp() < MIN_TIMESTAMP_SECS {
        DateTime::from_timestamp(MIN_TIMESTAMP_SECS, 0).unwrap_or(dt)
    } else if dt.timestamp() > MAX_TIMESTAMP_SECS {
        DateTime::from_timestamp(MAX_TIMESTAMP_SECS, 999_999_000).unwrap_or(dt)
    } else {
        dt
    }
}

/// A stored conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub jid: String,
    pub name: String,
    /// Timestamp of the newest message seen for this chat. Primary sort key
    /// for chat listings.
    pub last_message_time: DateTime<Utc>,
    /// Disappearing-message timer in seconds (0 = off).
    pub ephemeral_expiration: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Build a chat record with zero expiration. Bookkeeping timestamps are
    /// placeholders; the store sets them on write.
    pub fn new(jid: impl Into<String>, name: impl Into<String>, last_message_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            jid: jid.into(),
            name: name.into(),
            last_message_time,
            ephemeral_expiration: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_jid: String,
    /// JID of the sender.
    pub sender: String,
    /// Text content; empty for media-only messages.
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    /// Empty when the message carries no media.
    pub media_type: String,
    pub filename: String,
    pub url: String,
    pub media_key: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_length: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Build a plain text message with no media fields.
    pub fn text(
        id: impl Into<String>,
        chat_jid: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            chat_jid: chat_jid.into(),
            sender: sender.into(),
            content: content.into(),
            timestamp,
            is_from_me: false,
            media_type: String::new(),
            filename: String::new(),
            url: String::new(),
            media_key: Vec::new(),
            file_sha256: Vec::new(),
            file_enc_sha256: Vec::new(),
            file_length: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this message has anything user-visible to persist.
    pub fn has_payload(&self) -> bool {
        !self.content.is_empty() || !self.media_type.is_empty()
    }

    /// Whether this message carries media.
    pub fn has_media(&self) -> bool {
        !self.media_type.is_empty()
    }
}

/// Filters for listing chats. Every field is optional; set fields combine
/// with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFilter {
    /// Case-insensitive substring match on the chat name.
    pub search_name: Option<String>,
    /// Only chats with at least one media message.
    #[serde(default)]
    pub has_media: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filters for listing messages. Every field is optional; set fields
/// combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    pub chat_jid: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end_time: Option<DateTime<Utc>>,
    /// Only messages with a non-empty media type.
    #[serde(default)]
    pub media_only: bool,
    pub is_from_me: Option<bool>,
    pub limit: Option<u32>,
}

impl MessageFilter {
    /// Filter scoped to a single chat.
    pub fn for_chat(chat_jid: impl Into<String>) -> Self {
        Self {
            chat_jid: Some(chat_jid.into()),
            ..Self::default()
        }
    }
}

/// Row counts across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub chat_count: u64,
    pub message_count: u64,
}
