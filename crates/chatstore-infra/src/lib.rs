//! Infrastructure layer for chatstore.
//!
//! Implements the `ChatStorageRepository` contract from `chatstore-core`
//! twice (an embedded SQLite backend and a PostgreSQL backend), plus the
//! versioned schema migrations, backend selection, configuration loading,
//! and the default admin credential seed.

pub mod config;
pub mod error;
pub mod migration;
pub mod postgres;
pub mod query;
pub mod seed;
pub mod sqlite;
pub mod storage;
