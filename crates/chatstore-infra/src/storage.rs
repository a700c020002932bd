//! Backend selection.
//!
//! `ChatStorage` wraps whichever backend the configured URI names and
//! forwards every repository call to it. The repository trait uses native
//! async fn, so it is not object-safe; an enum takes the place of a
//! `Box<dyn ..>`.

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::chat::{Chat, ChatFilter, Message, MessageFilter, StorageStats};
use chatstore_types::config::{BackendKind, StorageConfig};
use chatstore_types::error::RepositoryError;
use tracing::info;

use crate::postgres::chat::PostgresChatRepository;
use crate::sqlite::chat::SqliteChatRepository;

/// The chat store for the configured backend.
#[derive(Clone)]
pub enum ChatStorage {
    Sqlite(SqliteChatRepository),
    Postgres(PostgresChatRepository),
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            ChatStorage::Sqlite($repo) => $call,
            ChatStorage::Postgres($repo) => $call,
        }
    };
}

impl ChatStorage {
    /// Connect to the backend selected by `uri`.
    ///
    /// Only connects; call `initialize_schema` before use.
    pub async fn connect(uri: &str, config: &StorageConfig) -> Result<Self, RepositoryError> {
        let backend = StorageConfig::backend_for(uri);
        let storage = match backend {
            BackendKind::Sqlite => Self::Sqlite(SqliteChatRepository::connect(uri, config).await?),
            BackendKind::Postgres => {
                Self::Postgres(PostgresChatRepository::connect(uri, config).await?)
            }
        };
        info!(
            backend = ?backend,
            max_connections = config.max_connections,
            "Chat storage connected"
        );
        Ok(storage)
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Postgres(_) => BackendKind::Postgres,
        }
    }

    /// Apply pending migrations; returns how many ran.
    pub async fn migrate(&self) -> Result<usize, RepositoryError> {
        dispatch!(self, repo => repo.migrate().await)
    }

    /// See `SqliteChatRepository::seed_default_admin`.
    pub async fn seed_default_admin(&self) -> Option<String> {
        dispatch!(self, repo => repo.seed_default_admin().await)
    }
}

impl ChatStorageRepository for ChatStorage {
    async fn initialize_schema(&self) -> Result<(), RepositoryError> {
        dispatch!(self, repo => repo.initialize_schema().await)
    }

    async fn store_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        dispatch!(self, repo => repo.store_chat(chat).await)
    }

    async fn get_chat(&self, jid: &str) -> Result<Option<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.get_chat(jid).await)
    }

    async fn delete_chat(&self, jid: &str) -> Result<bool, RepositoryError> {
        dispatch!(self, repo => repo.delete_chat(jid).await)
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.get_chats(filter).await)
    }

    async fn store_message(&self, message: &Message) -> Result<(), RepositoryError> {
        dispatch!(self, repo => repo.store_message(message).await)
    }

    async fn store_messages_batch(&self, messages: &[Message]) -> Result<(), RepositoryError> {
        dispatch!(self, repo => repo.store_messages_batch(messages).await)
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Option<Message>, RepositoryError> {
        dispatch!(self, repo => repo.get_message_by_id(id).await)
    }

    async fn get_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, RepositoryError> {
        dispatch!(self, repo => repo.get_messages(filter).await)
    }

    async fn search_messages(
        &self,
        chat_jid: &str,
        text: &str,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        dispatch!(self, repo => repo.search_messages(chat_jid, text, limit).await)
    }

    async fn delete_message(&self, id: &str, chat_jid: &str) -> Result<bool, RepositoryError> {
        dispatch!(self, repo => repo.delete_message(id, chat_jid).await)
    }

    async fn get_chat_message_count(&self, chat_jid: &str) -> Result<u64, RepositoryError> {
        dispatch!(self, repo => repo.get_chat_message_count(chat_jid).await)
    }

    async fn get_total_message_count(&self) -> Result<u64, RepositoryError> {
        dispatch!(self, repo => repo.get_total_message_count().await)
    }

    async fn get_total_chat_count(&self) -> Result<u64, RepositoryError> {
        dispatch!(self, repo => repo.get_total_chat_count().await)
    }

    async fn get_storage_statistics(&self) -> Result<StorageStats, RepositoryError> {
        dispatch!(self, repo => repo.get_storage_statistics().await)
    }

    async fn truncate_all_chats(&self) -> Result<(), RepositoryError> {
        dispatch!(self, repo => repo.truncate_all_chats().await)
    }
}
