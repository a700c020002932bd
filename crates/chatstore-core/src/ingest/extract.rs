//! Pull storable fields out of a decoded message payload.

use chatstore_types::event::{MediaAttachment, MessagePayload, PayloadContent};

/// Media fields of a message, all empty when the payload carries no media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub media_type: String,
    pub filename: String,
    pub url: String,
    pub media_key: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_length: u64,
}

impl MediaInfo {
    fn from_attachment(media_type: &str, media: &MediaAttachment, with_filename: bool) -> Self {
        Self {
            media_type: media_type.to_string(),
            filename: if with_filename {
                media.file_name.clone()
            } else {
                String::new()
            },
            url: media.url.clone(),
            media_key: media.media_key.clone(),
            file_sha256: media.file_sha256.clone(),
            file_enc_sha256: media.file_enc_sha256.clone(),
            file_length: media.file_length,
        }
    }
}

/// Text shown to the user: the message text, or a media caption.
pub fn extract_text(payload: &MessagePayload) -> String {
    match &payload.content {
        PayloadContent::Text { text } => text.clone(),
        PayloadContent::Image(media)
        | PayloadContent::Video(media)
        | PayloadContent::Document(media) => media.caption.clone(),
        PayloadContent::Audio(_)
        | PayloadContent::Sticker(_)
        | PayloadContent::EphemeralSetting { .. }
        | PayloadContent::Unsupported => String::new(),
    }
}

/// Media descriptor of the payload. Only documents carry a filename.
pub fn extract_media_info(payload: &MessagePayload) -> MediaInfo {
    match &payload.content {
        PayloadContent::Image(media) => MediaInfo::from_attachment("image", media, false),
        PayloadContent::Video(media) => MediaInfo::from_attachment("video", media, false),
        PayloadContent::Audio(media) => MediaInfo::from_attachment("audio", media, false),
        PayloadContent::Document(media) => MediaInfo::from_attachment("document", media, true),
        PayloadContent::Sticker(media) => MediaInfo::from_attachment("sticker", media, false),
        PayloadContent::Text { .. }
        | PayloadContent::EphemeralSetting { .. }
        | PayloadContent::Unsupported => MediaInfo::default(),
    }
}

/// Disappearing-message timer carried by the payload, 0 when absent.
///
/// A timer-change protocol message wins over the context timer.
pub fn extract_ephemeral_expiration(payload: &MessagePayload) -> u32 {
    match payload.content {
        PayloadContent::EphemeralSetting { expiration } => expiration,
        _ => payload.context.expiration,
    }
}
