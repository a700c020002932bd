//! PostgreSQL chat storage repository.
//!
//! Same contract and observable results as the SQLite repository. Text
//! tie-breakers sort with `COLLATE "C"` so both backends order bytewise.
//! Name and content matching use `ILIKE` under `COLLATE "C"`, which folds
//! ASCII letters only, as SQLite's `LIKE` does.

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::chat::{Chat, ChatFilter, Message, MessageFilter, normalize_timestamp};
use chatstore_types::config::StorageConfig;
use chatstore_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info, warn};

use super::pool::{connect_pool, connect_pool_with};
use crate::error::map_sqlx_error;
use crate::migration::{self, Migration, POSTGRES_MIGRATIONS};
use crate::query::{CHAT_COLUMNS, MESSAGE_COLUMNS, contains_pattern, effective_limit, nullable_bytes};
use crate::seed;

/// PostgreSQL-backed implementation of `ChatStorageRepository`.
#[derive(Clone)]
pub struct PostgresChatRepository {
    pool: PgPool,
}

impl PostgresChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool for `uri` and verify the server answers.
    pub async fn connect(uri: &str, config: &StorageConfig) -> Result<Self, RepositoryError> {
        let pool = connect_pool(uri, config).await?;
        Self::verified(pool).await
    }

    pub async fn connect_with(
        options: PgConnectOptions,
        config: &StorageConfig,
    ) -> Result<Self, RepositoryError> {
        let pool = connect_pool_with(options, config).await?;
        Self::verified(pool).await
    }

    async fn verified(pool: PgPool) -> Result<Self, RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations. Returns how many were applied.
    pub async fn migrate(&self) -> Result<usize, RepositoryError> {
        self.migrate_with(POSTGRES_MIGRATIONS).await
    }

    /// Apply the entries of `migrations` above the recorded version.
    pub async fn migrate_with(&self, migrations: &[Migration]) -> Result<usize, RepositoryError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS schema_info (
                   version    BIGINT PRIMARY KEY,
                   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
               )"#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Migration {
            version: 0,
            reason: e.to_string(),
        })?;

        let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_info")
            .fetch_one(&self.pool)
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

    async fn apply_migration(&self, migration: &Migration) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        run_script(&mut *tx, migration.sql).await?;
        sqlx::query(
            r#"INSERT INTO schema_info (version, updated_at) VALUES ($1, $2)
               ON CONFLICT (version) DO UPDATE SET updated_at = EXCLUDED.updated_at"#,
        )
        .bind(migration.version)
        .bind(normalize_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// Create the `admin` user when no users exist yet. Best-effort;
    /// returns the generated password when a user was created.
    pub async fn seed_default_admin(&self) -> Option<String> {
        let existing: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM app_users")
            .fetch_one(&self.pool)
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

        let now = normalize_timestamp(Utc::now());
        let result = sqlx::query(
            r#"INSERT INTO app_users (username, password_hash, role, enabled, created_at, updated_at)
               VALUES ($1, $2, $3, TRUE, $4, $5)
               ON CONFLICT (username) DO NOTHING"#,
        )
        .bind(credential.username)
        .bind(&credential.password_hash)
        .bind(credential.role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
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
// Row mapping
// ---------------------------------------------------------------------------

/// Run a migration script. Without bind arguments it goes over the simple
/// query protocol, so one string may hold several statements.
async fn run_script(conn: &mut PgConnection, sql: &str) -> Result<(), sqlx::Error> {
    (&mut *conn).execute(sql).await?;
    Ok(())
}

fn chat_from_row(row: &PgRow) -> Result<Chat, sqlx::Error> {
    let ephemeral_expiration: i64 = row.try_get("ephemeral_expiration")?;
    Ok(Chat {
        jid: row.try_get("jid")?,
        name: row.try_get("name")?,
        last_message_time: row.try_get("last_message_time")?,
        ephemeral_expiration: ephemeral_expiration as u32,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, sqlx::Error> {
    let content: Option<String> = row.try_get("content")?;
    let media_type: Option<String> = row.try_get("media_type")?;
    let filename: Option<String> = row.try_get("filename")?;
    let url: Option<String> = row.try_get("url")?;
    let media_key: Option<Vec<u8>> = row.try_get("media_key")?;
    let file_sha256: Option<Vec<u8>> = row.try_get("file_sha256")?;
    let file_enc_sha256: Option<Vec<u8>> = row.try_get("file_enc_sha256")?;
    let file_length: i64 = row.try_get("file_length")?;

    Ok(Message {
        id: row.try_get("id")?,
        chat_jid: row.try_get("chat_jid")?,
        sender: row.try_get("sender")?,
        content: content.unwrap_or_default(),
        timestamp: row.try_get("timestamp")?,
        is_from_me: row.try_get("is_from_me")?,
        media_type: media_type.unwrap_or_default(),
        filename: filename.unwrap_or_default(),
        url: url.unwrap_or_default(),
        media_key: media_key.unwrap_or_default(),
        file_sha256: file_sha256.unwrap_or_default(),
        file_enc_sha256: file_enc_sha256.unwrap_or_default(),
        file_length: file_length as u64,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_chats(rows: &[PgRow]) -> Result<Vec<Chat>, RepositoryError> {
    rows.iter()
        .map(|row| chat_from_row(row).map_err(map_sqlx_error))
        .collect()
}

fn map_messages(rows: &[PgRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| message_from_row(row).map_err(map_sqlx_error))
        .collect()
}

fn push_limit_offset(qb: &mut QueryBuilder<'_, Postgres>, limit: Option<i64>, offset: Option<u32>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = offset.filter(|&o| o > 0) {
        qb.push(" OFFSET ").push_bind(i64::from(offset));
    }
}

const MEDIA_PRESENT: &str = "media_type IS NOT NULL AND media_type <> ''";
const MESSAGE_ORDER: &str = r#" ORDER BY timestamp DESC, chat_jid COLLATE "C" ASC, id COLLATE "C" ASC"#;

async fn upsert_message<'c, E>(
    executor: E,
    message: &Message,
    now: DateTime<Utc>,
) -> Result<(), RepositoryError>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        r#"INSERT INTO messages (id, chat_jid, sender, content, timestamp, is_from_me,
                                 media_type, filename, url, media_key, file_sha256,
                                 file_enc_sha256, file_length, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
           ON CONFLICT (id, chat_jid) DO UPDATE SET
               sender = EXCLUDED.sender,
               content = EXCLUDED.content,
               timestamp = EXCLUDED.timestamp,
               is_from_me = EXCLUDED.is_from_me,
               media_type = EXCLUDED.media_type,
               filename = EXCLUDED.filename,
               url = EXCLUDED.url,
               media_key = EXCLUDED.media_key,
               file_sha256 = EXCLUDED.file_sha256,
               file_enc_sha256 = EXCLUDED.file_enc_sha256,
               file_length = EXCLUDED.file_length,
               updated_at = EXCLUDED.updated_at"#,
    )
    .bind(&message.id)
    .bind(&message.chat_jid)
    .bind(&message.sender)
    .bind(&message.content)
    .bind(normalize_timestamp(message.timestamp))
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

impl ChatStorageRepository for PostgresChatRepository {
    async fn initialize_schema(&self) -> Result<(), RepositoryError> {
        self.migrate().await.map(|_| ())
    }

    async fn store_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let now = normalize_timestamp(Utc::now());
        sqlx::query(
            r#"INSERT INTO chats (jid, name, last_message_time, ephemeral_expiration, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (jid) DO UPDATE SET
                   name = EXCLUDED.name,
                   last_message_time = EXCLUDED.last_message_time,
                   ephemeral_expiration = EXCLUDED.ephemeral_expiration,
                   updated_at = EXCLUDED.updated_at"#,
        )
        .bind(&chat.jid)
        .bind(&chat.name)
        .bind(normalize_timestamp(chat.last_message_time))
        .bind(i64::from(chat.ephemeral_expiration))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_chat(&self, jid: &str) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE jid = $1"))
            .bind(jid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref()
            .map(chat_from_row)
            .transpose()
            .map_err(map_sqlx_error)
    }

    async fn delete_chat(&self, jid: &str) -> Result<bool, RepositoryError> {
        // Messages go with the chat through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chats WHERE jid = $1")
            .bind(jid)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, RepositoryError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {CHAT_COLUMNS} FROM chats WHERE TRUE"));

        if let Some(search) = filter.search_name.as_deref().filter(|s| !s.is_empty()) {
            qb.push(r#" AND name COLLATE "C" ILIKE "#)
                .push_bind(contains_pattern(search))
                .push(" ESCAPE '\\'");
        }
        if filter.has_media {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM messages WHERE messages.chat_jid = chats.jid AND messages.{MEDIA_PRESENT})"
            ));
        }
        qb.push(r#" ORDER BY last_message_time DESC, jid COLLATE "C" ASC"#);
        push_limit_offset(&mut qb, effective_limit(filter.limit), filter.offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        map_chats(&rows)
    }

    async fn store_message(&self, message: &Message) -> Result<(), RepositoryError> {
        upsert_message(&self.pool, message, normalize_timestamp(Utc::now())).await
    }

    async fn store_messages_batch(&self, messages: &[Message]) -> Result<(), RepositoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        let now = normalize_timestamp(Utc::now());
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for message in messages {
            if let Err(e) = upsert_message(&mut *tx, message, now).await {
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
            r#"SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1
               ORDER BY timestamp DESC, chat_jid COLLATE "C" ASC LIMIT 1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref()
            .map(message_from_row)
            .transpose()
            .map_err(map_sqlx_error)
    }

    async fn get_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, RepositoryError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE TRUE"));

        if let Some(chat_jid) = &filter.chat_jid {
            qb.push(" AND chat_jid = ").push_bind(chat_jid.clone());
        }
        if let Some(start) = filter.start_time {
            qb.push(" AND timestamp >= ").push_bind(normalize_timestamp(start));
        }
        if let Some(end) = filter.end_time {
            qb.push(" AND timestamp <= ").push_bind(normalize_timestamp(end));
        }
        if filter.media_only {
            qb.push(format!(" AND {MEDIA_PRESENT}"));
        }
        if let Some(is_from_me) = filter.is_from_me {
            qb.push(" AND is_from_me = ").push_bind(is_from_me);
        }
        qb.push(MESSAGE_ORDER);
        push_limit_offset(&mut qb, effective_limit(filter.limit), None);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
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
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_jid = "
        ));
        qb.push_bind(chat_jid.to_string())
            .push(r#" AND content COLLATE "C" ILIKE "#)
            .push_bind(contains_pattern(text))
            .push(" ESCAPE '\\'")
            .push(MESSAGE_ORDER);
        push_limit_offset(&mut qb, effective_limit(Some(limit)), None);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        map_messages(&rows)
    }

    async fn delete_message(&self, id: &str, chat_jid: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND chat_jid = $2")
            .bind(id)
            .bind(chat_jid)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chat_message_count(&self, chat_jid: &str) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_jid = $1")
            .bind(chat_jid)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn get_total_message_count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn get_total_chat_count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn truncate_all_chats(&self) -> Result<(), RepositoryError> {
        sqlx::query("TRUNCATE TABLE messages, chats RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::testing::{fresh_repo, unmigrated_repo};
    use chrono::{TimeZone, Timelike};

    fn ts(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
    }

    async fn seed_chat(repo: &PostgresChatRepository, jid: &str, name: &str, at: DateTime<Utc>) {
        repo.store_chat(&Chat::new(jid, name, at)).await.unwrap();
    }

    #[tokio::test]
    async fn test_migrate_converges() {
        let Some(repo) = unmigrated_repo().await else {
            return;
        };
        assert_eq!(repo.migrate().await.unwrap(), POSTGRES_MIGRATIONS.len());
        assert_eq!(repo.migrate().await.unwrap(), 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_info")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_failed_migration_leaves_no_partial_state() {
        let Some(repo) = unmigrated_repo().await else {
            return;
        };
        let steps = [
            Migration {
                version: 1,
                name: "create_alpha",
                sql: "CREATE TABLE IF NOT EXISTS alpha (id BIGINT PRIMARY KEY);",
            },
            Migration {
                version: 2,
                name: "create_beta_then_fail",
                sql: "CREATE TABLE IF NOT EXISTS beta (id BIGINT PRIMARY KEY);\n\
                      INSERT INTO missing_table (id) VALUES (1);",
            },
        ];

        let err = repo.migrate_with(&steps).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Migration { version: 2, .. }), "got {err:?}");

        let max: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_info")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(max, 1);

        let tables: Vec<String> = sqlx::query_scalar(
            r#"SELECT table_name::TEXT FROM information_schema.tables
               WHERE table_schema = current_schema() AND table_name IN ('alpha', 'beta')
               ORDER BY table_name"#,
        )
        .fetch_all(repo.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_store_chat_is_idempotent_upsert() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        let mut chat = Chat::new("123@s.whatsapp.net", "Alice", ts(0));
        repo.store_chat(&chat).await.unwrap();
        chat.name = "Alice B".to_string();
        chat.ephemeral_expiration = 604_800;
        repo.store_chat(&chat).await.unwrap();

        assert_eq!(repo.get_total_chat_count().await.unwrap(), 1);
        let stored = repo.get_chat(&chat.jid).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice B");
        assert_eq!(stored.ephemeral_expiration, 604_800);
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        seed_chat(&repo, "a@s.whatsapp.net", "A", ts(0)).await;
        let mut batch: Vec<Message> = (0..5)
            .map(|i| {
                Message::text(
                    format!("M{i}"),
                    "a@s.whatsapp.net",
                    "a@s.whatsapp.net",
                    "x",
                    ts(i),
                )
            })
            .collect();
        batch[2].chat_jid = "ghost@s.whatsapp.net".to_string();

        let err = repo.store_messages_batch(&batch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Constraint(_)), "got {err:?}");
        assert_eq!(repo.get_total_message_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_media_fields_and_precision_round_trip() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        let precise = ts(0).with_nanosecond(987_654_321).unwrap();
        seed_chat(&repo, "a@s.whatsapp.net", "A", precise).await;

        let mut message = Message::text("M1", "a@s.whatsapp.net", "a@s.whatsapp.net", "", precise);
        message.media_type = "document".to_string();
        message.filename = "report.pdf".to_string();
        message.media_key = vec![9, 8, 7];
        message.file_length = 4096;
        repo.store_message(&message).await.unwrap();

        let stored = repo.get_message_by_id("M1").await.unwrap().unwrap();
        assert_eq!(stored.timestamp, normalize_timestamp(precise));
        assert_eq!(stored.filename, "report.pdf");
        assert_eq!(stored.media_key, vec![9, 8, 7]);
        assert!(stored.file_sha256.is_empty());
        assert_eq!(stored.file_length, 4096);
    }

    #[tokio::test]
    async fn test_filters_and_search() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        seed_chat(&repo, "a@s.whatsapp.net", "Family", ts(10)).await;
        seed_chat(&repo, "b@s.whatsapp.net", "Work", ts(10)).await;
        let mut photo = Message::text("P1", "b@s.whatsapp.net", "b@s.whatsapp.net", "", ts(5));
        photo.media_type = "image".to_string();
        repo.store_messages_batch(&[
            Message::text("M1", "a@s.whatsapp.net", "a@s.whatsapp.net", "Hello there", ts(1)),
            Message::text("M2", "a@s.whatsapp.net", "a@s.whatsapp.net", "HELLO again", ts(2)),
            photo,
        ])
        .await
        .unwrap();

        let chats = repo.get_chats(&ChatFilter::default()).await.unwrap();
        let jids: Vec<&str> = chats.iter().map(|c| c.jid.as_str()).collect();
        assert_eq!(jids, vec!["a@s.whatsapp.net", "b@s.whatsapp.net"]);

        let media_chats = repo
            .get_chats(&ChatFilter {
                has_media: true,
                ..ChatFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(media_chats.len(), 1);
        assert_eq!(media_chats[0].jid, "b@s.whatsapp.net");

        let named = repo
            .get_chats(&ChatFilter {
                search_name: Some("fam".to_string()),
                ..ChatFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(named.len(), 1);

        let hits = repo.search_messages("a@s.whatsapp.net", "hello", 0).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["M2", "M1"]);
    }

    #[tokio::test]
    async fn test_case_folding_is_ascii_only() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        seed_chat(&repo, "u@s.whatsapp.net", "Ünal Çelik", ts(0)).await;
        repo.store_message(&Message::text("U1", "u@s.whatsapp.net", "u@s.whatsapp.net", "ÜBER cool", ts(1)))
            .await
            .unwrap();

        let by_name = |needle: &str| ChatFilter {
            search_name: Some(needle.to_string()),
            ..ChatFilter::default()
        };
        assert!(repo.get_chats(&by_name("ünal")).await.unwrap().is_empty());
        assert_eq!(repo.get_chats(&by_name("Ünal")).await.unwrap().len(), 1);
        assert_eq!(repo.get_chats(&by_name("ÇELIK")).await.unwrap().len(), 1);

        assert!(repo.search_messages("u@s.whatsapp.net", "über", 0).await.unwrap().is_empty());
        assert_eq!(repo.search_messages("u@s.whatsapp.net", "Über COOL", 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_truncate() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        seed_chat(&repo, "a@s.whatsapp.net", "A", ts(0)).await;
        repo.store_message(&Message::text("M1", "a@s.whatsapp.net", "a@s.whatsapp.net", "x", ts(1)))
            .await
            .unwrap();

        assert!(repo.delete_chat("a@s.whatsapp.net").await.unwrap());
        assert_eq!(repo.get_total_message_count().await.unwrap(), 0);

        seed_chat(&repo, "b@s.whatsapp.net", "B", ts(0)).await;
        repo.truncate_all_chats().await.unwrap();
        assert_eq!(repo.get_total_chat_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_default_admin_runs_once() {
        let Some(repo) = fresh_repo().await else {
            return;
        };
        assert!(repo.seed_default_admin().await.is_some());
        assert!(repo.seed_default_admin().await.is_none());
    }
}
