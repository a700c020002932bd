//! SQLite chat storage repository.
//!
//! Implements `ChatStorageRepository` from `chatstore-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, reads on the
//! reader pool and every write on the single-connection writer.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (UTC, microseconds),
//! so ordering and range comparisons on the text match time order.

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::chat::{Chat, ChatFilter, Message, MessageFilter, normalize_timestamp};
use chatstore_types::config::StorageConfig;
use chatstore_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Executor, QueryBuilder, Row, Sqlite};
use tracing::{debug, info, warn};

use super::pool::DatabasePool;
use crate::error::map_sqlx_error;
use crate::migration::{self, Migration, SQLITE_MIGRATIONS};
use crate::query::{CHAT_COLUMNS, MESSAGE_COLUMNS, contains_pattern, effective_limit, nullable_bytes};
use crate::seed;

/// SQLite-backed implementation of `ChatStorageRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open the database at `uri` and verify the writer connection.
    pub async fn connect(uri: &str, config: &StorageConfig) -> Result<Self, RepositoryError> {
        let pool = DatabasePool::connect(uri, config).await?;
        sqlx::query("SELECT 1")
            .execute(&pool.writer)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Apply pending migrations. Returns how many were applied.
    pub async fn migrate(&self) -> Result<usize, RepositoryError> {
        self.migrate_with(SQLITE_MIGRATIONS).await
    }

    /// Apply the entries of `migrations` above the recorded version, in
    /// order. Stops at the first failure; earlier steps stay committed.
    pub async fn migrate_with(&self, migrations: &[Migration]) -> Result<usize, RepositoryError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS schema_info (
                   version    INTEGER PRIMARY KEY NOT NULL,
                   updated_at TEXT NOT NULL
               )"#,
        )
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Migration {
            version: 0,
            reason: e.to_string(),
        })?;

        let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_info")
            .fetch_one(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Migration {
                version: 0,
                reason: e.to_string(),
            })?;

        let mut applied = 0;
        for migration in migration::pending(migrations, current) {
            self.apply_migration(migration)
                .await
                .map_err(|e| RepositoryError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
            info!(version = migration.version, name = migration.name, "Applied migration");
            applied += 1;
        }

        if applied == 0 {
            debug!(version = current, "Schema up to date");
        }
        Ok(applied)
    }

    /// Script and ledger entry commit together or not at all.
    async fn apply_migration(&self, migration: &Migration) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.writer.begin().await?;
        run_script(&mut *tx, migration.sql).await?;
        sqlx::query(
            r#"INSERT INTO schema_info (version, updated_at) VALUES (?, ?)
               ON CONFLICT (version) DO UPDATE SET updated_at = excluded.updated_at"#,
        )
        .bind(migration.version)
        .bind(format_datetime(&Utc::now()))
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// Create the `admin` user when no users exist yet.
    ///
    /// Best-effort: failures are logged and reported as `None`. Returns the
    /// generated plaintext password when a user was created.
    pub async fn seed_default_admin(&self) -> Option<String> {
        let existing: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM app_users")
            .fetch_one(&self.pool.reader)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Could not check for existing users, skipping admin seed");
                return None;
            }
        };
        if existing > 0 {
            return None;
        }

        let credential = match seed::generate_admin_credential() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Could not hash default admin password");
                return None;
            }
        };

        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            r#"INSERT INTO app_users (username, password_hash, role, enabled, created_at, updated_at)
               VALUES (?, ?, ?, 1, ?, ?)
               ON CONFLICT (username) DO NOTHING"#,
        )
        .bind(credential.username)
        .bind(&credential.password_hash)
        .bind(credential.role)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                info!(
                    username = credential.username,
                    password = %credential.password,
                    "Created default admin user; change this password"
                );
                Some(credential.password)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Could not create default admin user");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    jid: String,
    name: String,
    last_message_time: String,
    ephemeral_expiration: i64,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            jid: row.try_get("jid")?,
            name: row.try_get("name")?,
            last_message_time: row.try_get("last_message_time")?,
            ephemeral_expiration: row.try_get("ephemeral_expiration")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        Ok(Chat {
            jid: self.jid,
            name: self.name,
            last_message_time: parse_datetime(&self.last_message_time)?,
            ephemeral_expiration: self.ephemeral_expiration as u32,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    chat_jid: String,
    sender: String,
    content: Option<String>,
    timestamp: String,
    is_from_me: bool,
    media_type: Option<String>,
    filename: Option<String>,
    url: Option<String>,
    media_key: Option<Vec<u8>>,
    file_sha256: Option<Vec<u8>>,
    file_enc_sha256: Option<Vec<u8>>,
    file_length: i64,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_jid: row.try_get("chat_jid")?,
            sender: row.try_get("sender")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
            is_from_me: row.try_get("is_from_me")?,
            media_type: row.try_get("media_type")?,
            filename: row.try_get("filename")?,
            url: row.try_get("url")?,
            media_key: row.try_get("media_key")?,
            file_sha256: row.try_get("file_sha256")?,
            file_enc_sha256: row.try_get("file_enc_sha256")?,
            file_length: row.try_get("file_length")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            id: self.id,
            chat_jid: self.chat_jid,
            sender: self.sender,
            content: self.content.unwrap_or_default(),
            timestamp: parse_datetime(&self.timestamp)?,
            is_from_me: self.is_from_me,
            media_type: self.media_type.unwrap_or_default(),
            filename: self.filename.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            media_key: self.media_key.unwrap_or_default(),
            file_sha256: self.file_sha256.unwrap_or_default(),
            file_enc_sha256: self.file_enc_sha256.unwrap_or_default(),
            file_length: self.file_length as u64,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run every statement in `sql` on one connection.
async fn run_script(conn: &mut SqliteConnection, sql: &str) -> Result<(), sqlx::Error> {
    (&mut *conn).execute(sql).await?;
    Ok(())
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime '{s}': {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    normalize_timestamp(*dt).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_chats(rows: &[SqliteRow]) -> Result<Vec<Chat>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ChatRow::from_row(row)
                .map_err(map_sqlx_error)?
                .into_chat()
        })
        .collect()
}

fn map_messages(rows: &[SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| {
            MessageRow::from_row(row)
                .map_err(map_sqlx_error)?
                .into_message()
        })
        .collect()
}

/// SQLite needs a LIMIT clause before OFFSET; -1 means unbounded.
fn push_limit_offset(qb: &mut QueryBuilder<'_, Sqlite>, limit: Option<i64>, offset: Option<u32>) {
    let offset = offset.filter(|&o| o > 0);
    match (limit, offset) {
        (Some(limit), _) => {
            qb.push(" LIMIT ").push_bind(limit);
        }
        (None, Some(_)) => {
            qb.push(" LIMIT -1");
        }
        (None, None) => {}
    }
    if let Some(offset) = offset {
        qb.push(" OFFSET ").push_bind(i64::from(offset));
    }
}

const MEDIA_PRESENT: &str = "media_type IS NOT NULL AND media_type != ''";

/// Upsert one message on any executor (pool or open transaction).
async fn upsert_message<'c, E>(executor: E, message: &Message, now: &str) -> Result<(), RepositoryError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO messages (id, chat_jid, sender, content, timestamp, is_from_me,
                                 media_type, filename, url, media_key, file_sha256,
                                 file_enc_sha256, file_length, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (id, chat_jid) DO UPDATE SET
               sender = excluded.sender,
               content = excluded.content,
               timestamp = excluded.timestamp,
               is_from_me = excluded.is_from_me,
               media_type = excluded.media_type,
               filename = excluded.filename,
               url = excluded.url,
               media_key = excluded.media_key,
               file_sha256 = excluded.file_sha256,
               file_enc_sha256 = excluded.file_enc_sha256,
               file_length = excluded.file_length,
               updated_at = excluded.updated_at"#,
    )
    .bind(&message.id)
    .bind(&message.chat_jid)
    .bind(&message.sender)
    .bind(&message.content)
    .bind(format_datetime(&message.timestamp))
    .bind(message.is_from_me)
    .bind(&message.media_type)
    .bind(&message.filename)
    .bind(&message.url)
    .bind(nullable_bytes(&message.media_key))
    .bind(nullable_bytes(&message.file_sha256))
    .bind(nullable_bytes(&message.file_enc_sha256))
    .bind(message.file_length as i64)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// ChatStorageRepository implementation
// ---------------------------------------------------------------------------

impl ChatStorageRepository for SqliteChatRepository {
    async fn initialize_schema(&self) -> Result<(), RepositoryError> {
        self.migrate().await.map(|_| ())
    }

    async fn store_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());
        sqlx::query(
            r#"INSERT INTO chats (jid, name, last_message_time, ephemeral_expiration, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (jid) DO UPDATE SET
                   name = excluded.name,
                   last_message_time = excluded.last_message_time,
                   ephemeral_expiration = excluded.ephemeral_expiration,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&chat.jid)
        .bind(&chat.name)
        .bind(format_datetime(&chat.last_message_time))
        .bind(i64::from(chat.ephemeral_expiration))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_chat(&self, jid: &str) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE jid = ?"))
            .bind(jid)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let chat_row = ChatRow::from_row(&row).map_err(map_sqlx_error)?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn delete_chat(&self, jid: &str) -> Result<bool, RepositoryError> {
        // Messages go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chats WHERE jid = ?")
            .bind(jid)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {CHAT_COLUMNS} FROM chats WHERE 1 = 1"));

        if let Some(search) = filter.search_name.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND name LIKE ")
                .push_bind(contains_pattern(search))
                .push(" ESCAPE '\\'");
        }
        if filter.has_media {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM messages WHERE messages.chat_jid = chats.jid AND messages.{MEDIA_PRESENT})"
            ));
        }
        qb.push(" ORDER BY last_message_time DESC, jid ASC");
        push_limit_offset(&mut qb, effective_limit(filter.limit), filter.offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        map_chats(&rows)
    }

    async fn store_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());
        upsert_message(&self.pool.writer, message, &now).await
    }

    async fn store_messages_batch(&self, messages: &[Message]) -> Result<(), RepositoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;
        for message in messages {
            if let Err(e) = upsert_message(&mut *tx, message, &now).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back message batch");
                }
                return Err(e);
            }
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(count = messages.len(), "Stored message batch");
        Ok(())
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ? \
             ORDER BY timestamp DESC, chat_jid ASC LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let message_row = MessageRow::from_row(&row).map_err(map_sqlx_error)?;
                Ok(Some(message_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn get_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, RepositoryError> {
        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE 1 = 1"));

        if let Some(chat_jid) = &filter.chat_jid {
            qb.push(" AND chat_jid = ").push_bind(chat_jid.clone());
        }
        if let Some(start) = &filter.start_time {
            qb.push(" AND timestamp >= ").push_bind(format_datetime(start));
        }
        if let Some(end) = &filter.end_time {
            qb.push(" AND timestamp <= ").push_bind(format_datetime(end));
        }
        if filter.media_only {
            qb.push(format!(" AND {MEDIA_PRESENT}"));
        }
        if let Some(is_from_me) = filter.is_from_me {
            qb.push(" AND is_from_me = ").push_bind(is_from_me);
        }
        qb.push(" ORDER BY timestamp DESC, chat_jid ASC, id ASC");
        push_limit_offset(&mut qb, effective_limit(filter.limit), None);

        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        map_messages(&rows)
    }

    async fn search_messages(
        &self,
        chat_jid: &str,
        text: &str,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_jid = "
        ));
        qb.push_bind(chat_jid.to_string())
            .push(" AND content LIKE ")
            .push_bind(contains_pattern(text))
            .push(" ESCAPE '\\' ORDER BY timestamp DESC, chat_jid ASC, id ASC");
        push_limit_offset(&mut qb, effective_limit(Some(limit)), None);

        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        map_messages(&rows)
    }

    async fn delete_message(&self, id: &str, chat_jid: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ? AND chat_jid = ?")
            .bind(id)
            .bind(chat_jid)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chat_message_count(&self, chat_jid: &str) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_jid = ?")
            .bind(chat_jid)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn get_total_message_count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn get_total_chat_count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn truncate_all_chats(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM chats")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // sqlite_sequence only exists once an AUTOINCREMENT table does.
        let has_sequence: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        if has_sequence.is_some() {
            sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('messages', 'chats')")
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
