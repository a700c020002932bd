//! Configuration loader for chatstore.
//!
//! Reads `config.toml` from the data directory (`~/.chatstore/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use chatstore_types::config::{AppConfig, StorageConfig};

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "CHATSTORE_DATA_DIR";

/// Overrides the database URI from `config.toml`.
pub const DB_URI_ENV: &str = "CHATSTORE_DB_URI";

/// File name of the default SQLite database inside the data directory.
pub const DEFAULT_DB_FILE: &str = "chatstorage.db";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`AppConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Resolve the data directory: `CHATSTORE_DATA_DIR`, then `~/.chatstore`,
/// then `.chatstore` in the working directory.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chatstore");
    }

    PathBuf::from(".chatstore")
}

/// Resolve the database URI: `CHATSTORE_DB_URI`, then `storage.uri`, then a
/// SQLite file in the data directory.
pub fn resolve_database_uri(storage: &StorageConfig, data_dir: &Path) -> String {
    database_uri_with_override(std::env::var(DB_URI_ENV).ok(), storage, data_dir)
}

fn database_uri_with_override(
    env_override: Option<String>,
    storage: &StorageConfig,
    data_dir: &Path,
) -> String {
    env_override
        .filter(|uri| !uri.trim().is_empty())
        .or_else(|| storage.uri.clone().filter(|uri| !uri.trim().is_empty()))
        .unwrap_or_else(|| {
            format!(
                "sqlite://{}?mode=rwc",
                data_dir.join(DEFAULT_DB_FILE).display()
            )
        })
}
