//! Helpers for tests that need a live PostgreSQL server.
//!
//! Tests call `test_url()` and return early when `CHATSTORE_TEST_POSTGRES_URL`
//! is unset. Each repository gets its own schema so tests can run in
//! parallel against one database.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use chatstore_core::repository::ChatStorageRepository;
use chatstore_types::config::StorageConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use super::chat::PostgresChatRepository;

pub const TEST_URL_ENV: &str = "CHATSTORE_TEST_POSTGRES_URL";

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn test_url() -> Option<String> {
    std::env::var(TEST_URL_ENV).ok().filter(|url| !url.is_empty())
}

/// A migrated repository in a fresh schema, or `None` without a server.
pub async fn fresh_repo() -> Option<PostgresChatRepository> {
    let repo = unmigrated_repo().await?;
    repo.initialize_schema().await.unwrap();
    Some(repo)
}

/// A repository in a fresh, empty schema.
pub async fn unmigrated_repo() -> Option<PostgresChatRepository> {
    let url = test_url()?;
    let schema = format!(
        "chatstore_test_{}_{}_{}",
        std::process::id(),
        chrono::Utc::now().timestamp_micros(),
        SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
    );

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)
        .unwrap()
        .options([("search_path", schema.as_str())]);
    let config = StorageConfig {
        max_connections: 4,
        min_connections: 0,
        ..StorageConfig::default()
    };
    Some(
        PostgresChatRepository::connect_with(options, &config)
            .await
            .unwrap(),
    )
}
