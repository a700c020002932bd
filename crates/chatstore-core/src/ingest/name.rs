//! Chat display-name derivation.
//!
//! Pure merge of the previously stored name with what an incoming event
//! tells us. Precedence, in order:
//!
//! 1. A stored non-empty name is kept, unless it is a placeholder (equal to
//!    the chat's user fragment or the sender's bare user) and a non-empty
//!    push name that differs from it is available; then the push name wins.
//! 2. With no stored name: groups become `Group <user>`, newsletters become
//!    `Newsletter <user>`, and direct chats take the push name if it is
//!    distinct from both identifiers, else the sender's user, else the
//!    chat's user fragment.

use chatstore_types::jid::{Jid, JidKind};

/// Derive the display name for `chat`.
///
/// `existing_name` is the name currently stored for the chat, if any.
pub fn derive_chat_name(
    existing_name: Option<&str>,
    chat: &Jid,
    sender_user: &str,
    push_name: &str,
) -> String {
    if let Some(existing) = existing_name.filter(|name| !name.is_empty()) {
        let is_placeholder = existing == chat.user || existing == sender_user;
        if is_placeholder && !push_name.is_empty() && push_name != existing {
            return push_name.to_string();
        }
        return existing.to_string();
    }

    match chat.kind() {
        JidKind::Group => format!("Group {}", chat.user),
        JidKind::Newsletter => format!("Newsletter {}", chat.user),
        JidKind::Direct => {
            if !push_name.is_empty() && push_name != sender_user && push_name != chat.user {
                push_name.to_string()
            } else if !sender_user.is_empty() {
                sender_user.to_string()
            } else {
                chat.user.clone()
            }
        }
    }
}
