//! Configuration types for chatstore.
//!
//! `AppConfig` represents the top-level `config.toml`; the `[storage]` table
//! selects and sizes the database backend.

use serde::{Deserialize, Serialize};

/// Top-level configuration. Loaded from `~/.chatstore/config.toml`; every
/// field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Which relational engine backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Postgres,
}

/// Chat storage connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database URI. `postgres://...` selects PostgreSQL; anything else is
    /// treated as SQLite. When unset, a SQLite file in the data directory
    /// is used.
    #[serde(default)]
    pub uri: Option<String>,

    /// Maximum number of open connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Idle connections kept open between uses.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Create a default admin credential when none exists.
    #[serde(default = "default_true")]
    pub seed_default_admin: bool,
}

fn default_max_connections() -> u32 {
    25
}

fn default_min_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            seed_default_admin: true,
        }
    }
}

impl StorageConfig {
    /// Backend implied by a database URI.
    pub fn backend_for(uri: &str) -> BackendKind {
        if uri.to_ascii_lowercase().starts_with("postgres") {
            BackendKind::Postgres
        } else {
            BackendKind::Sqlite
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert!(config.uri.is_none());
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 5);
        assert!(config.seed_default_admin);
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.max_connections, 25);
    }

    #[test]
    fn test_app_config_deserialize_with_values() {
        let toml_str = r#"
[storage]
uri = "postgres://user:pw@localhost:5432/chats"
max_connections = 10
seed_default_admin = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.storage.uri.as_deref(),
            Some("postgres://user:pw@localhost:5432/chats")
        );
        assert_eq!(config.storage.max_connections, 10);
        assert_eq!(config.storage.min_connections, 5);
        assert!(!config.storage.seed_default_admin);
    }

    #[test]
    fn test_backend_for_uri() {
        assert_eq!(
            StorageConfig::backend_for("postgres://localhost/db"),
            BackendKind::Postgres
        );
        assert_eq!(
            StorageConfig::backend_for("PostgreSQL://localhost/db"),
            BackendKind::Postgres
        );
        assert_eq!(
            StorageConfig::backend_for("sqlite://storages/chat.db"),
            BackendKind::Sqlite
        );
        assert_eq!(
            StorageConfig::backend_for("file:storages/chat.db"),
            BackendKind::Sqlite
        );
    }
}
