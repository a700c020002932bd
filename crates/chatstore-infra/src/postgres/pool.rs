//! PostgreSQL connection pool construction.

use std::str::FromStr;
use std::time::Duration;

use chatstore_types::config::StorageConfig;
use chatstore_types::error::RepositoryError;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Parse `uri` and open a pool sized from `config`.
pub async fn connect_pool(uri: &str, config: &StorageConfig) -> Result<PgPool, RepositoryError> {
    let options = PgConnectOptions::from_str(uri)
        .map_err(|e| RepositoryError::Connection(format!("invalid PostgreSQL URI: {e}")))?;
    connect_pool_with(options, config).await
}

/// Open a pool from prepared connect options.
pub async fn connect_pool_with(
    options: PgConnectOptions,
    config: &StorageConfig,
) -> Result<PgPool, RepositoryError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(|e| RepositoryError::Connection(e.to_string()))
}
