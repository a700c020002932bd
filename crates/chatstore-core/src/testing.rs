//! In-memory `ChatStorageRepository` for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chatstore_types::chat::{Chat, ChatFilter, Message, MessageFilter};
use chatstore_types::error::RepositoryError;

use crate::repository::ChatStorageRepository;

#[derive(Default)]
pub struct InMemoryRepository {
    chats: Mutex<BTreeMap<String, Chat>>,
    messages: Mutex<BTreeMap<(String, String), Message>>,
    fail_reads: AtomicBool,
    fail_message_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn insert_chat(&self, chat: Chat) {
        self.chats.lock().unwrap().insert(chat.jid.clone(), chat);
    }

    pub fn chat(&self, jid: &str) -> Option<Chat> {
        self.chats.lock().unwrap().get(jid).cloned()
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.chats.lock().unwrap().values().cloned().collect()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().values().cloned().collect()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_message_writes(&self, fail: bool) {
        self.fail_message_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("read failure".to_string()));
        }
        Ok(())
    }

    fn check_message_write(&self) -> Result<(), RepositoryError> {
        if self.fail_message_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("write failure".to_string()));
        }
        Ok(())
    }

    fn sorted_messages(&self, keep: impl Fn(&Message) -> bool) -> Vec<Message> {
        let mut out: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| keep(m))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.chat_jid.cmp(&b.chat_jid))
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }
}

impl ChatStorageRepository for InMemoryRepository {
    async fn initialize_schema(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn store_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        match chats.get_mut(&chat.jid) {
            Some(current) => {
                current.name = chat.name.clone();
                current.last_message_time = chat.last_message_time;
                current.ephemeral_expiration = chat.ephemeral_expiration;
            }
            None => {
                chats.insert(chat.jid.clone(), chat.clone());
            }
        }
        Ok(())
    }

    async fn get_chat(&self, jid: &str) -> Result<Option<Chat>, RepositoryError> {
        self.check_read()?;
        Ok(self.chat(jid))
    }

    async fn delete_chat(&self, jid: &str) -> Result<bool, RepositoryError> {
        self.messages.lock().unwrap().retain(|(_, chat), _| chat != jid);
        Ok(self.chats.lock().unwrap().remove(jid).is_some())
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, RepositoryError> {
        self.check_read()?;
        let mut chats = self.chats();
        if let Some(search) = &filter.search_name {
            let needle = search.to_lowercase();
            chats.retain(|c| c.name.to_lowercase().contains(&needle));
        }
        if filter.has_media {
            let messages = self.messages.lock().unwrap();
            chats.retain(|c| messages.values().any(|m| m.chat_jid == c.jid && m.has_media()));
        }
        chats.sort_by(|a, b| {
            b.last_message_time
                .cmp(&a.last_message_time)
                .then_with(|| a.jid.cmp(&b.jid))
        });
        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(chats.into_iter().skip(offset).take(limit).collect())
    }

    async fn store_message(&self, message: &Message) -> Result<(), RepositoryError> {
        self.check_message_write()?;
        if !self.chats.lock().unwrap().contains_key(&message.chat_jid) {
            return Err(RepositoryError::Constraint("chat does not exist".to_string()));
        }
        self.messages.lock().unwrap().insert(
            (message.id.clone(), message.chat_jid.clone()),
            message.clone(),
        );
        Ok(())
    }

    async fn store_messages_batch(&self, messages: &[Message]) -> Result<(), RepositoryError> {
        for message in messages {
            self.store_message(message).await?;
        }
        Ok(())
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Option<Message>, RepositoryError> {
        self.check_read()?;
        Ok(self.sorted_messages(|m| m.id == id).into_iter().next())
    }

    async fn get_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, RepositoryError> {
        self.check_read()?;
        let mut out = self.sorted_messages(|m| {
            filter.chat_jid.as_ref().is_none_or(|jid| &m.chat_jid == jid)
                && filter.start_time.is_none_or(|t| m.timestamp >= t)
                && filter.end_time.is_none_or(|t| m.timestamp <= t)
                && (!filter.media_only || m.has_media())
                && filter.is_from_me.is_none_or(|f| m.is_from_me == f)
        });
        if let Some(limit) = filter.limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }

    async fn search_messages(
        &self,
        chat_jid: &str,
        text: &str,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.check_read()?;
        let needle = text.to_lowercase();
        let mut out = self.sorted_messages(|m| {
            m.chat_jid == chat_jid && m.content.to_lowercase().contains(&needle)
        });
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn delete_message(&self, id: &str, chat_jid: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .remove(&(id.to_string(), chat_jid.to_string()))
            .is_some())
    }

    async fn get_chat_message_count(&self, chat_jid: &str) -> Result<u64, RepositoryError> {
        Ok(self.sorted_messages(|m| m.chat_jid == chat_jid).len() as u64)
    }

    async fn get_total_message_count(&self) -> Result<u64, RepositoryError> {
        Ok(self.messages.lock().unwrap().len() as u64)
    }

    async fn get_total_chat_count(&self) -> Result<u64, RepositoryError> {
        Ok(self.chats.lock().unwrap().len() as u64)
    }

    async fn truncate_all_chats(&self) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().clear();
        self.chats.lock().unwrap().clear();
        Ok(())
    }
}
