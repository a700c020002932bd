//! SQL fragments and value conversions shared by both backends.

/// Columns selected for a `Chat`, in row-mapping order.
pub const CHAT_COLUMNS: &str =
    "jid, name, last_message_time, ephemeral_expiration, created_at, updated_at";

/// Columns selected for a `Message`, in row-mapping order.
pub const MESSAGE_COLUMNS: &str = "id, chat_jid, sender, content, timestamp, is_from_me, \
     media_type, filename, url, media_key, file_sha256, file_enc_sha256, file_length, \
     created_at, updated_at";

/// Build a substring pattern for `LIKE ... ESCAPE '\'`, escaping the
/// wildcard characters in `text`.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// A caller limit as SQL; `None` and zero both mean "no limit".
pub fn effective_limit(limit: Option<u32>) -> Option<i64> {
    limit.filter(|&l| l > 0).map(i64::from)
}

/// Empty byte strings are stored as NULL so both backends read them back
/// the same way.
pub fn nullable_bytes(bytes: &[u8]) -> Option<&[u8]> {
    (!bytes.is_empty()).then_some(bytes)
}
