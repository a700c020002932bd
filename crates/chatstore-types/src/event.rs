//! Inbound message events emitted by the protocol client.
//!
//! The protocol client decodes wire messages into these plain structures;
//! the ingestion translator in `chatstore-core` turns them into stored
//! `Chat`/`Message` records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jid::Jid;

/// Addressing and bookkeeping for one received (or echoed) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    /// Conversation the message belongs to.
    pub chat: Jid,
    pub sender: Jid,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    /// Display-name hint supplied by the sender. Empty when absent.
    #[serde(default)]
    pub push_name: String,
}

/// A decoded message event. `message` is `None` for events that carry no
/// message body (receipts, retries, decryption failures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub info: MessageInfo,
    pub message: Option<MessagePayload>,
}

/// Message body plus the context attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub content: PayloadContent,
    #[serde(default)]
    pub context: ContextInfo,
}

impl MessagePayload {
    pub fn new(content: PayloadContent) -> Self {
        Self {
            content,
            context: ContextInfo::default(),
        }
    }

    /// Attach a disappearing-message timer to the payload context.
    pub fn with_expiration(mut self, seconds: u32) -> Self {
        self.context.expiration = seconds;
        self
    }
}

/// Metadata carried alongside a message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    /// Disappearing-message timer in effect when the message was sent
    /// (0 = not present).
    #[serde(default)]
    pub expiration: u32,
}

/// The kinds of message body the store knows how to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayloadContent {
    /// Plain or extended text.
    Text { text: String },
    Image(MediaAttachment),
    Video(MediaAttachment),
    Audio(MediaAttachment),
    Document(MediaAttachment),
    Sticker(MediaAttachment),
    /// Protocol message changing the chat's disappearing-message timer.
    EphemeralSetting { expiration: u32 },
    /// Anything else (reactions, polls, calls). Carries nothing storable.
    Unsupported,
}

/// Downloadable media descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub media_key: Vec<u8>,
    #[serde(default)]
    pub file_sha256: Vec<u8>,
    #[serde(default)]
    pub file_enc_sha256: Vec<u8>,
    #[serde(default)]
    pub file_length: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_content_serde_tag() {
        let content = PayloadContent::Text {
            text: "hello".to_string(),
        };
        let json = serde_json::to_string(&content).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"hello"}"#);

        let parsed: PayloadContent =
            serde_json::from_str(r#"{"type":"image","caption":"pic","file_length":42}"#).unwrap();
        match parsed {
            PayloadContent::Image(media) => {
                assert_eq!(media.caption, "pic");
                assert_eq!(media.file_length, 42);
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_with_expiration() {
        let payload = MessagePayload::new(PayloadContent::Unsupported).with_expiration(86_400);
        assert_eq!(payload.context.expiration, 86_400);
    }
}
