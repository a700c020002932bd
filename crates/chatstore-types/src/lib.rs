//! Shared domain types for chatstore.
//!
//! Chats, messages, query filters, JIDs, inbound message events, storage
//! configuration, and the error types shared by every layer.
//!
//! No infrastructure dependencies: only serde, chrono, and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod jid;
