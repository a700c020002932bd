//! PostgreSQL storage backend.
//!
//! A pooled client-server backend. Schema, upsert semantics, and result
//! ordering match the SQLite backend.

pub mod chat;
pub mod pool;

#[cfg(test)]
pub(crate) mod testing;
