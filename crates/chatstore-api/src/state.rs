//! Application state: configuration plus an open, migrated chat store.

use std::path::PathBuf;

use anyhow::Context;
use chatstore_infra::config::{load_app_config, resolve_data_dir, resolve_database_uri};
use chatstore_infra::storage::ChatStorage;
use chatstore_types::config::StorageConfig;
use console::style;

/// Shared state handed to every command.
pub struct AppState {
    pub storage: ChatStorage,
    pub data_dir: PathBuf,
    pub config: StorageConfig,
    /// Migrations applied while opening the store.
    pub migrations_applied: usize,
}

impl AppState {
    /// Resolve configuration, connect, migrate, and seed the default admin.
    ///
    /// Connection and migration failures are fatal; the seed is best-effort.
    pub async fn init(db_override: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists (the default SQLite file lives there)
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_app_config(&data_dir).await.storage;
        let uri = db_override.unwrap_or_else(|| resolve_database_uri(&config, &data_dir));

        let storage = ChatStorage::connect(&uri, &config)
            .await
            .context("Failed to connect to chat storage")?;
        let migrations_applied = storage
            .migrate()
            .await
            .context("Failed to initialize chat storage schema")?;
        tracing::debug!(
            backend = ?storage.backend(),
            migrations_applied,
            "Chat storage ready"
        );

        if config.seed_default_admin {
            if let Some(password) = storage.seed_default_admin().await {
                eprintln!();
                eprintln!(
                    "  {} Created default user {} with password {}",
                    style("!").yellow().bold(),
                    style("admin").cyan(),
                    style(&password).bold()
                );
                eprintln!("    Store it now; it will not be shown again.");
                eprintln!();
            }
        }

        Ok(Self {
            storage,
            data_dir,
            config,
            migrations_applied,
        })
    }
}
