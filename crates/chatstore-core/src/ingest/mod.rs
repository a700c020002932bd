//! Event ingestion: protocol message events to stored chats and messages.
//!
//! Every ingestion is read-then-merge-then-write: the current chat row is
//! read once, merged with the event (name, expiration, last message time),
//! and written back through the repository's upserts. A failure between
//! the chat and message writes leaves a consistent state that a retry of
//! the same event completes.

pub mod extract;
pub mod name;

use chatstore_types::chat::{Chat, Message, normalize_timestamp};
use chatstore_types::error::IngestError;
use chatstore_types::event::MessageEvent;
use chatstore_types::jid::Jid;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::repository::ChatStorageRepository;

use self::extract::{extract_ephemeral_expiration, extract_media_info, extract_text};
use self::name::derive_chat_name;

/// Translates inbound events into repository writes.
///
/// Generic over `ChatStorageRepository` so core never depends on a
/// concrete backend.
pub struct ChatIngestor<R: ChatStorageRepository> {
    repo: R,
}

impl<R: ChatStorageRepository> ChatIngestor<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Store the chat and (if it has visible content) the message carried by
    /// `event`.
    ///
    /// Returns the stored message, or `None` when the event had no payload
    /// or the payload had neither text nor media.
    pub async fn create_message(&self, event: &MessageEvent) -> Result<Option<Message>, IngestError> {
        let Some(payload) = &event.message else {
            return Ok(None);
        };
        let info = &event.info;
        let chat_jid = info.chat.to_string();

        let existing = self
            .repo
            .get_chat(&chat_jid)
            .await
            .map_err(IngestError::ChatLookup)?;

        let name = derive_chat_name(
            existing.as_ref().map(|c| c.name.as_str()),
            &info.chat,
            &info.sender.user,
            &info.push_name,
        );

        let incoming_expiration = extract_ephemeral_expiration(payload);
        let ephemeral_expiration = if incoming_expiration > 0 {
            incoming_expiration
        } else {
            existing.as_ref().map_or(0, |c| c.ephemeral_expiration)
        };

        let chat = Chat {
            ephemeral_expiration,
            ..Chat::new(
                chat_jid.clone(),
                name,
                advance_last_message_time(existing.as_ref(), info.timestamp),
            )
        };
        self.repo
            .store_chat(&chat)
            .await
            .map_err(IngestError::ChatStore)?;

        let content = extract_text(payload);
        let media = extract_media_info(payload);
        if content.is_empty() && media.media_type.is_empty() {
            debug!(chat_jid = %chat_jid, message_id = %info.id, "Event has no visible content, message skipped");
            return Ok(None);
        }

        let message = Message {
            is_from_me: info.is_from_me,
            media_type: media.media_type,
            filename: media.filename,
            url: media.url,
            media_key: media.media_key,
            file_sha256: media.file_sha256,
            file_enc_sha256: media.file_enc_sha256,
            file_length: media.file_length,
            ..Message::text(
                info.id.clone(),
                chat_jid,
                info.sender.to_string(),
                content,
                normalize_timestamp(info.timestamp),
            )
        };
        self.repo
            .store_message(&message)
            .await
            .map_err(IngestError::MessageStore)?;

        Ok(Some(message))
    }

    /// Resolve the display name `chat` would get from an event with the
    /// given sender and push name, reading the currently stored name.
    pub async fn resolve_chat_name(
        &self,
        chat: &Jid,
        sender_user: &str,
        push_name: &str,
    ) -> Result<String, IngestError> {
        let existing = self
            .repo
            .get_chat(&chat.to_string())
            .await
            .map_err(IngestError::ChatLookup)?;

        Ok(derive_chat_name(
            existing.as_ref().map(|c| c.name.as_str()),
            chat,
            sender_user,
            push_name,
        ))
    }

    /// Persist a message this client sent.
    ///
    /// The recipient chat is created when missing (named from the recipient
    /// address) and otherwise keeps its name and expiration while its last
    /// message time advances. Empty content stores no message.
    pub async fn store_sent_message_with_context(
        &self,
        message_id: &str,
        sender_jid: &str,
        recipient_jid: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Message>, IngestError> {
        let recipient: Jid = recipient_jid
            .parse()
            .map_err(|_| IngestError::InvalidJid(recipient_jid.to_string()))?;
        let chat_jid = recipient.to_string();

        let existing = self
            .repo
            .get_chat(&chat_jid)
            .await
            .map_err(IngestError::ChatLookup)?;

        let chat = match &existing {
            Some(current) => Chat {
                last_message_time: advance_last_message_time(existing.as_ref(), timestamp),
                ..current.clone()
            },
            None => Chat::new(
                chat_jid.clone(),
                derive_chat_name(None, &recipient, &recipient.user, ""),
                normalize_timestamp(timestamp),
            ),
        };
        self.repo
            .store_chat(&chat)
            .await
            .map_err(IngestError::ChatStore)?;

        if content.is_empty() {
            return Ok(None);
        }

        let message = Message {
            is_from_me: true,
            ..Message::text(
                message_id,
                chat_jid,
                sender_jid,
                content,
                normalize_timestamp(timestamp),
            )
        };
        self.repo
            .store_message(&message)
            .await
            .map_err(IngestError::MessageStore)?;

        Ok(Some(message))
    }
}

/// Last message time after seeing a message at `timestamp`; never moves
/// backwards.
fn advance_last_message_time(existing: Option<&Chat>, timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let timestamp = normalize_timestamp(timestamp);
    match existing {
        Some(chat) if chat.last_message_time > timestamp => chat.last_message_time,
        _ => timestamp,
    }
}
