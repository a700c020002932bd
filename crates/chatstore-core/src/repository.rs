//! ChatStorageRepository trait definition.
//!
//! One storage contract for chats and messages. The infrastructure layer
//! (chatstore-infra) implements it for SQLite and PostgreSQL; both must
//! return identical results for identical inputs.

use chatstore_types::chat::{Chat, ChatFilter, Message, MessageFilter, StorageStats};
use chatstore_types::error::RepositoryError;
use tracing::info;

/// Repository trait for chat history persistence.
///
/// Covers three concerns:
/// - **Schema:** forward-only versioned migrations.
/// - **Chats:** upsert, lookup, listing, deletion.
/// - **Messages:** upsert (single and batch), lookup, listing, search,
///   deletion, and aggregate counts.
///
/// Every write is an upsert resolved by the backend's conflict clause, so
/// concurrent callers need no extra locking. Uses native async fn in traits
/// (Rust 2024 edition, no async_trait macro).
pub trait ChatStorageRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Schema
    // -----------------------------------------------------------------------

    /// Apply every migration newer than the recorded schema version.
    ///
    /// Idempotent: with nothing pending it only reads the ledger.
    fn initialize_schema(
        &self,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Chats
    // -----------------------------------------------------------------------

    /// Insert a chat, or overwrite name, last message time, and expiration
    /// of the existing row with the same JID.
    fn store_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_chat(
        &self,
        jid: &str,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Delete a chat and (through the schema's cascade) its messages.
    /// Returns `true` if the chat existed.
    fn delete_chat(
        &self,
        jid: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// List chats, newest activity first.
    fn get_chats(
        &self,
        filter: &ChatFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Insert a message, or overwrite every mutable field of the existing
    /// row with the same `(id, chat_jid)`.
    fn store_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Upsert every message in one transaction. Either all are stored or
    /// none are.
    fn store_messages_batch(
        &self,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up a message by ID alone. When several chats share the ID, the
    /// most recent by timestamp wins.
    fn get_message_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// List messages, newest first.
    fn get_messages(
        &self,
        filter: &MessageFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Case-insensitive substring search on content within one chat, newest
    /// first.
    fn search_messages(
        &self,
        chat_jid: &str,
        text: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Returns `true` if the message existed.
    fn delete_message(
        &self,
        id: &str,
        chat_jid: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Aggregates and maintenance
    // -----------------------------------------------------------------------

    fn get_chat_message_count(
        &self,
        chat_jid: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn get_total_message_count(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn get_total_chat_count(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Chat and message counts in one snapshot.
    fn get_storage_statistics(
        &self,
    ) -> impl std::future::Future<Output = Result<StorageStats, RepositoryError>> + Send {
        async move {
            let chat_count = self.get_total_chat_count().await?;
            let message_count = self.get_total_message_count().await?;
            Ok(StorageStats {
                chat_count,
                message_count,
            })
        }
    }

    /// Remove every chat and message and reset identity sequences.
    fn truncate_all_chats(
        &self,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// `truncate_all_chats` preceded by a log line tagged with `log_prefix`.
    fn truncate_all_data_with_logging(
        &self,
        log_prefix: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        async move {
            info!("{log_prefix} Truncating chats and messages");
            self.truncate_all_chats().await
        }
    }
}
