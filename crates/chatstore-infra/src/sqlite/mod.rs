//! SQLite storage backend.
//!
//! Embedded database in WAL mode behind split read/write connection pools.

pub mod chat;
pub mod pool;
