//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. This module provides a `DatabasePool`
//! with a bounded reader pool for concurrent reads and a single-connection
//! writer pool for serialized writes. Both use WAL journal mode and enforce
//! foreign keys, so deleting a chat cascades to its messages.

use std::str::FromStr;
use std::time::Duration;

use chatstore_types::config::StorageConfig;
use chatstore_types::error::RepositoryError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};


/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to `max_connections`) for SELECT queries.
/// - `writer`: Single-connection pool for INSERT/UPDATE/DELETE and migrations.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools. The writer is opened first so the database file
    /// exists before any read-only connection is made.
    pub async fn connect(database_url: &str, config: &StorageConfig) -> Result<Self, RepositoryError> {
        let url = normalize_sqlite_url(database_url);
        let base_opts = SqliteConnectOptions::from_str(&url)
            .map_err(|e| RepositoryError::Connection(format!("invalid SQLite URL '{url}': {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        let reader = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .min_connections(config.min_connections.min(config.max_connections))
            .connect_with(read_opts)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        Ok(Self { reader, writer })
    }
}

/// Accept `file:` URIs and strip driver-specific `_name=value` parameters
/// so older connection strings keep working.
pub fn normalize_sqlite_url(uri: &str) -> String {
    let rest = uri
        .strip_prefix("sqlite://")
        .or_else(|| uri.strip_prefix("sqlite:"))
        .or_else(|| uri.strip_prefix("file:"))
        .unwrap_or(uri);

    let (path, params) = match rest.split_once('?') {
        Some((path, params)) => (path, Some(params)),
        None => (rest, None),
    };

    let kept: Vec<&str> = params
        .into_iter()
        .flat_map(|p| p.split('&'))
        .filter(|p| !p.is_empty() && !p.starts_with('_'))
        .collect();

    if kept.is_empty() {
        format!("sqlite://{path}")
    } else {
        format!("sqlite://{path}?{}", kept.join("&"))
    }
}
