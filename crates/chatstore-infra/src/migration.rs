//! Versioned schema scripts.
//!
//! Each backend has an append-only list of migrations numbered from 1. The
//! applied version is recorded in the `schema_info` ledger table; a
//! migration runs only when its version is above the recorded one. Never
//! edit a released script; add a new one.

/// One forward-only schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// 1-based position in the list.
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const SQLITE_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_chats_and_messages",
        sql: include_str!("../migrations/sqlite/0001_create_chats_and_messages.sql"),
    },
    Migration {
        version: 2,
        name: "index_message_id",
        sql: include_str!("../migrations/sqlite/0002_index_message_id.sql"),
    },
    Migration {
        version: 3,
        name: "create_app_users",
        sql: include_str!("../migrations/sqlite/0003_create_app_users.sql"),
    },
];

pub const POSTGRES_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_chats_and_messages",
        sql: include_str!("../migrations/postgres/0001_create_chats_and_messages.sql"),
    },
    Migration {
        version: 2,
        name: "index_message_id",
        sql: include_str!("../migrations/postgres/0002_index_message_id.sql"),
    },
    Migration {
        version: 3,
        name: "create_app_users",
        sql: include_str!("../migrations/postgres/0003_create_app_users.sql"),
    },
];

/// Migrations newer than `current`, in order.
pub fn pending(migrations: &[Migration], current: i64) -> impl Iterator<Item = &Migration> {
    migrations.iter().filter(move |m| m.version > current)
}

/// Highest version in a migration list.
pub fn latest_version(migrations: &[Migration]) -> i64 {
    migrations.last().map_or(0, |m| m.version)
}
